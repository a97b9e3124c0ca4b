#![no_main]

use libfuzzer_sys::fuzz_target;
use spotgate_telegram::Update;

fuzz_target!(|data: &[u8]| {
    // Webhook bodies are attacker-controlled JSON.
    if let Ok(update) = serde_json::from_slice::<Update>(data) {
        if let Some(change) = &update.chat_member {
            let _ = change.joined_user().map(|u| u.display_name());
        }
        if let Some(message) = &update.message {
            for user in &message.new_chat_members {
                let _ = user.display_name();
            }
        }
    }
});
