use crate::storage::BackendKind;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::ROCKET, text.style(theme().banner.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().ok.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().failure.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().fallback.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().icon.clone()),
        label.style(theme().label.clone()),
        value
    );
}

/// Which store the process ended up with.
pub fn storage_ready(kind: BackendKind) {
    let icon = if kind.is_fallback() { Icons::WARN } else { Icons::CHECK };
    println!(
        "{} {}: {}",
        icon,
        "Storage".style(theme().label.clone()),
        kind.as_str().style(theme().backend(kind).clone())
    );
}

pub fn section(title: &str) {
    println!();
    println!("━{}━", title.style(theme().banner.clone()));
}
