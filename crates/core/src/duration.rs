/// Render a number of seconds as a compact `1d 2h 3m 4s` string.
///
/// Zero-valued units are omitted; zero or negative input renders as `0s`.
pub fn format_duration(total_secs: i64) -> String {
    if total_secs <= 0 {
        return "0s".to_string();
    }

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let parts: Vec<String> = [(days, "d"), (hours, "h"), (minutes, "m"), (seconds, "s")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    parts.join(" ")
}
