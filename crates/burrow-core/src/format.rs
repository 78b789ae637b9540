//! Display helpers.

const KB: f64 = 1024.0;
const MB: f64 = KB * 1024.0;
const GB: f64 = MB * 1024.0;

/// Render a byte count in the largest unit (B, KB, MB, GB) that is at least 1.
///
/// Uses 1024-based scaling and two decimals for every unit above bytes.
pub fn format_size(bytes: u64) -> String {
    let size = bytes as f64;
    if size >= GB {
        format!("{:.2} GB", size / GB)
    } else if size >= MB {
        format!("{:.2} MB", size / MB)
    } else if size >= KB {
        format!("{:.2} KB", size / KB)
    } else {
        format!("{bytes} B")
    }
}
