fn group_thousands(abs: u64) -> String {
    let digits = abs.to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Format a won amount with thousands separators: ₩1,234,567
pub fn money(val: i64) -> String {
    let body = group_thousands(val.unsigned_abs());
    if val < 0 {
        format!("-₩{body}")
    } else {
        format!("₩{body}")
    }
}

/// Signed difference for variance display: +₩500, -₩1,000, ₩0
pub fn signed_money(val: i64) -> String {
    if val > 0 {
        format!("+{}", money(val))
    } else {
        money(val)
    }
}
