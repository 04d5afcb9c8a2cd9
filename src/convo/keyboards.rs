//! Fixed button labels and the reply keyboards built from them.

use crate::transport::{Button, Keyboard};

pub const PUSH_UPS: &str = "Push ups";
pub const SQUATS: &str = "Squats";
pub const CRUNCHES: &str = "Crunches";
pub const SOMETHING_ELSE: &str = "Something else...";
pub const DONE: &str = "Done";
pub const SEND_NUMBER: &str = "Send number";
pub const MY_PHONE_NUMBER: &str = "My phone number";
pub const CANCEL: &str = "Cancel";

/// The predefined exercise categories.
pub const CATEGORIES: &[&str] = &[PUSH_UPS, SQUATS, CRUNCHES];

/// The main category keyboard, shown whenever the party is choosing.
pub fn category_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![Button::new(PUSH_UPS), Button::new(SQUATS)],
            vec![Button::new(CRUNCHES), Button::new(SOMETHING_ELSE)],
            vec![Button::new(DONE), Button::new(SEND_NUMBER)],
        ],
        one_time: true,
    }
}

/// Contact-request keyboard. `Cancel` has no handler; pressing it is the
/// unmatched-input no-op.
pub fn contact_keyboard() -> Keyboard {
    Keyboard {
        rows: vec![
            vec![Button::contact_request(MY_PHONE_NUMBER)],
            vec![Button::new(CANCEL)],
        ],
        one_time: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_keyboard_lists_all_labels() {
        let keyboard = category_keyboard();
        let labels: Vec<&str> = keyboard
            .rows
            .iter()
            .flatten()
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(
            labels,
            vec![PUSH_UPS, SQUATS, CRUNCHES, SOMETHING_ELSE, DONE, SEND_NUMBER]
        );
        assert!(keyboard.one_time);
        assert!(keyboard.rows.iter().flatten().all(|b| !b.request_contact));
    }

    #[test]
    fn contact_keyboard_requests_contact_on_first_button() {
        let keyboard = contact_keyboard();
        assert!(keyboard.rows[0][0].request_contact);
        assert_eq!(keyboard.rows[0][0].label, MY_PHONE_NUMBER);
        assert!(!keyboard.rows[1][0].request_contact);
    }
}
