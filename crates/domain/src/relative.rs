use chrono::{DateTime, Utc};

/// 最后更新时间的相对标签: "Xm" / "Xh" / "Xd"
pub fn last_updated_label(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    // 未来时间按 0 处理
    let elapsed = (now - updated_at).max(chrono::Duration::zero());

    let days = elapsed.num_days();
    if days == 0 {
        let hours = elapsed.num_hours();
        if hours == 0 {
            return format!("{}m", elapsed.num_minutes());
        }
        return format!("{}h", hours);
    }
    format!("{}d", days)
}

/// "January 5, 2024"
pub fn prettify_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

/// 编辑按钮的提示文字
pub fn edit_tooltip(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> String {
    if updated_at > created_at {
        format!("Last edited {}", prettify_date(updated_at))
    } else {
        "Edit".to_string()
    }
}
