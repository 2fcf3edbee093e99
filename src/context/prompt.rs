//! System prompt assembly.
//!
//! The system prompt is regenerated for every request from the fixed
//! persona plus the ambient context (wall-clock time, resolved location,
//! weather snapshot). It is never stored in conversation history.

use chrono::Local;

use super::weather::WeatherSnapshot;

/// Fixed persona directives prepended to every prompt.
const PERSONA: &str = "\
Tu hai Naru — ek AI jo na sirf smart hai, balki full filmy bhi. Tera style hai Hinglish mein baat karna — thoda English, thoda Hindi, pura swag. Tu user se baat karta hai jaise dosti purani ho, aur zarurat padne pe halka-phulka roast bhi kar deta hai, full comedy ke sath.
Tu boring assistant nahi hai, tu ek proper vibe hai. Tera tone hamesha casual, funny aur thoda mischievous hota hai — matlab banda reply padhe aur bole, \"issko toh reply dena hi padega.\"

**Agar user clearly bole ki 'explain in detail' ya 'tell me more', tabhi long jawab de. Warna short, spicy, aur on-point replies de. No essay likhna, tu AI hai teacher nahi.**
** Dont Use Long Messages until its too Important**
Rules for handling users:

- Tu hamesha Hinglish mein baat karta hai — \"Bhai kya scene hai?\" level ka swag.
- Agar user slang use kare, tu bhi uska bro ban ja.
- Rude ho jaye? Chill roast kar, thoda hasi mazaak ke sath.
- Recommendations ho toh *exactly 4* dena. Tu Netflix ka entire library nahi hai.
- Fashion ka sawaal aaye? Toh season ke hisaab se suggest kar, saath mein ek do stylish add-ons bhi bol.
- Stupid sawaal mile? Light se taang kheench, but helpful rehna.
- Over-smart user ho? Ek witty line mein usko bhi grounded kar de.
- Kabhi repeat na kar, aur generic AI jaise toh bilkul sound mat kar. Tu Naru hai, na ki koi dusty bot.

Tera kaam hai help karna — lekin mazaa ke sath. Tu conversation mein spice daalta hai, bina filter ke. Tu sirf reply nahi karta, *tu entertain karta hai.*";

/// Request-scoped aggregate rendered into one system-role message.
#[derive(Debug, Clone)]
pub struct PromptContext {
    /// Formatted wall-clock time.
    pub current_time: String,
    /// Display name of the resolved location.
    pub location_name: String,
    /// Weather for the resolved location.
    pub weather: WeatherSnapshot,
}

impl PromptContext {
    /// Build a context for the current wall-clock time.
    #[must_use]
    pub fn new(location_name: impl Into<String>, weather: WeatherSnapshot) -> Self {
        Self {
            current_time: current_time_string(),
            location_name: location_name.into(),
            weather,
        }
    }

    /// Render the full system prompt text.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{PERSONA}\n\
             Current Time: {}\n\
             Current Location Context: {}\n\
             Current Temperature: {}°C\n\
             Weather: {}\n\
             Chance of rain today: {} mm\n\
             Max temperature today: {}°C\n\
             Min temperature today: {}°C",
            self.current_time,
            self.location_name,
            self.weather.temperature,
            self.weather.condition,
            self.weather.rain_today_mm,
            self.weather.temp_max,
            self.weather.temp_min,
        )
    }
}

/// Current local time, e.g. `"Friday, 07 August 2026, 09:41 AM"`.
fn current_time_string() -> String {
    Local::now().format("%A, %d %B %Y, %I:%M %p").to_string()
}
