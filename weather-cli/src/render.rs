use std::fmt::Write;

use chrono::Datelike;
use weather_core::ForecastSnapshot;

/// Plain-text rendering of a forecast: headline, current stats, then one
/// line per forecast day.
pub fn snapshot(snapshot: &ForecastSnapshot) -> String {
    let mut out = String::new();
    let current = &snapshot.current;

    let _ = writeln!(
        out,
        "{}, {}",
        snapshot.location.name, snapshot.location.country
    );
    let _ = writeln!(
        out,
        "{:.0}°  {}",
        current.temperature_c, current.condition_text
    );
    let _ = writeln!(
        out,
        "wind {:.0} km/h  humidity {}%  sunrise {}",
        current.wind_kph,
        current.humidity_pct,
        current.sunrise.as_deref().unwrap_or("--")
    );

    if !snapshot.daily_forecast.is_empty() {
        out.push('\n');
    }
    for day in &snapshot.daily_forecast {
        let _ = writeln!(
            out,
            "{} {}  {:>4.0}°  {}",
            day.date.weekday(),
            day.date.format("%m-%d"),
            day.avg_temperature_c,
            day.condition_text
        );
    }

    out
}
