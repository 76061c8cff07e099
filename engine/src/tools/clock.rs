//! Time tool
//!
//! Reports the current date and time. Only UTC is actually supported;
//! asking for any other timezone answers with local time and says so.

use super::ToolInput;
use chrono::{Local, Utc};

pub struct ClockTool;

impl ClockTool {
    pub fn invoke(&self, input: &ToolInput) -> String {
        // Only an explicit free-text argument counts as a timezone request
        let timezone = match input {
            ToolInput::Text(s) => s.as_str(),
            _ => "UTC",
        };

        if timezone.eq_ignore_ascii_case("utc") {
            format!(
                "Current time (UTC): {}",
                Utc::now().format("%Y-%m-%d %H:%M:%S")
            )
        } else {
            format!(
                "Current time (local): {} (Timezone conversion not implemented)",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            )
        }
    }
}
