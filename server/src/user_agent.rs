/// Browser, operating system and device families parsed from a `User-Agent` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub browser: String,
    pub os: String,
    pub device: String,
}

impl ClientInfo {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        Self {
            browser: classify_browser(user_agent).to_string(),
            os: classify_os(user_agent).to_string(),
            device: classify_device(user_agent).to_string(),
        }
    }
}

fn is_bot(normalized: &str) -> bool {
    ["bot", "spider", "crawler", "curl/", "wget/", "python-requests"]
        .iter()
        .any(|marker| normalized.contains(marker))
}

// Order matters: Edge and Opera also advertise Chrome, and Chrome advertises Safari.
fn classify_browser(user_agent: Option<&str>) -> &'static str {
    let Some(ua) = user_agent else {
        return "Other";
    };
    let normalized = ua.to_ascii_lowercase();
    if normalized.contains("edg/") || normalized.contains("edge/") {
        "Edge"
    } else if normalized.contains("opr/") || normalized.contains("opera") {
        "Opera"
    } else if normalized.contains("firefox/") || normalized.contains("fxios/") {
        "Firefox"
    } else if normalized.contains("chrome/") || normalized.contains("crios/") {
        "Chrome"
    } else if normalized.contains("safari/") {
        "Safari"
    } else if normalized.contains("curl/") {
        "curl"
    } else {
        "Other"
    }
}

fn classify_os(user_agent: Option<&str>) -> &'static str {
    let Some(ua) = user_agent else {
        return "Other";
    };
    let normalized = ua.to_ascii_lowercase();
    if normalized.contains("windows") {
        "Windows"
    } else if normalized.contains("iphone") || normalized.contains("ipad") {
        "iOS"
    } else if normalized.contains("android") {
        "Android"
    } else if normalized.contains("mac os x") || normalized.contains("macintosh") {
        "Mac OS X"
    } else if normalized.contains("cros ") {
        "Chrome OS"
    } else if normalized.contains("linux") {
        "Linux"
    } else {
        "Other"
    }
}

fn classify_device(user_agent: Option<&str>) -> &'static str {
    let Some(ua) = user_agent else {
        return "Other";
    };
    let normalized = ua.to_ascii_lowercase();
    if is_bot(&normalized) {
        "Bot"
    } else if normalized.contains("ipad") || normalized.contains("tablet") {
        "Tablet"
    } else if normalized.contains("mobile")
        || normalized.contains("iphone")
        || normalized.contains("android")
    {
        "Mobile"
    } else if normalized.contains("mozilla/") {
        "Desktop"
    } else {
        "Other"
    }
}
