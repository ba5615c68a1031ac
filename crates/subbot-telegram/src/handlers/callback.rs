use teloxide::types::CallbackQuery;

use subbot_core::{
    domain::ChatId,
    messaging::types::{self, IncomingUpdate},
};

pub(crate) fn to_update(q: &CallbackQuery) -> IncomingUpdate {
    let chat_id = q.message.as_ref().map(|m| ChatId(m.chat.id.0));
    let reply_to_text = q
        .message
        .as_ref()
        .and_then(|m| m.reply_to_message())
        .and_then(|r| r.text())
        .map(str::to_string);

    IncomingUpdate::Callback(types::CallbackQuery {
        chat_id,
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
        reply_to_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(message: Option<serde_json::Value>) -> CallbackQuery {
        let mut v = json!({
            "id": "cb-1",
            "from": {"id": 1, "is_bot": false, "first_name": "Ann"},
            "chat_instance": "ci-1",
            "data": "audio|"
        });
        if let (Some(obj), Some(m)) = (v.as_object_mut(), message) {
            obj.insert("message".to_string(), m);
        }
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn carries_chat_and_replied_link() {
        let q = query(Some(json!({
            "message_id": 8,
            "date": 1700000001,
            "chat": {"id": 42, "type": "private", "first_name": "Ann"},
            "text": "Select format:",
            "reply_to_message": {
                "message_id": 7,
                "date": 1700000000,
                "chat": {"id": 42, "type": "private", "first_name": "Ann"},
                "text": "https://example.com/a-very-long-link"
            }
        })));

        let IncomingUpdate::Callback(cb) = to_update(&q) else {
            panic!("expected callback");
        };
        assert_eq!(cb.chat_id, Some(ChatId(42)));
        assert_eq!(cb.callback_id, "cb-1");
        assert_eq!(cb.data, "audio|");
        assert_eq!(
            cb.reply_to_text.as_deref(),
            Some("https://example.com/a-very-long-link")
        );
    }

    #[test]
    fn inaccessible_message_has_no_chat() {
        let IncomingUpdate::Callback(cb) = to_update(&query(None)) else {
            panic!("expected callback");
        };
        assert_eq!(cb.chat_id, None);
        assert_eq!(cb.reply_to_text, None);
    }
}
