/// Human readable label for the host platform, stored with every sample.
pub fn device_label() -> String {
    label_for_platform(std::env::consts::OS).to_string()
}

pub fn label_for_platform(platform: &str) -> &'static str {
    let platform = platform.to_ascii_lowercase();
    if platform.contains("ios") || platform.contains("iphone") || platform.contains("ipad") {
        "iPhone (iOS)"
    } else if platform.contains("android") {
        "Android Phone"
    } else if platform.contains("mac") {
        "Mac (macOS)"
    } else if platform.contains("win") {
        "Windows PC"
    } else if platform.contains("linux") {
        "Linux Device"
    } else {
        "Unknown Device"
    }
}
