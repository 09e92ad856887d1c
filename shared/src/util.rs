/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a globally-unique order id.
///
/// Format: `{user_id}_{store_id}_{uuid-v4}` — embeds owner and store for
/// debuggability, the uuid suffix guarantees uniqueness.
pub fn order_id(user_id: &str, store_id: &str) -> String {
    format!("{}_{}_{}", user_id, store_id, uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_unique_and_prefixed() {
        let a = order_id("u1", "s1");
        let b = order_id("u1", "s1");
        assert!(a.starts_with("u1_s1_"));
        assert_ne!(a, b);
    }
}
