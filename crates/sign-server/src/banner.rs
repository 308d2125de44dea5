use owo_colors::OwoColorize;

const MIN_BANNER_WIDTH: u16 = 45;

const BANNER: &str = r"
  ____  _               ____
 / ___|(_) __ _ _ __   / ___|  ___ _ ____   _____ _ __
 \___ \| |/ _` | '_ \  \___ \ / _ \ '__\ \ / / _ \ '__|
  ___) | | (_| | | | |  ___) |  __/ |   \ V /  __/ |
 |____/|_|\__, |_| |_| |____/ \___|_|    \_/ \___|_|
          |___/
";

fn banner_for_width(columns: Option<u16>) -> &'static str {
    match columns {
        Some(columns) if columns >= MIN_BANNER_WIDTH => BANNER,
        _ => "Sign Server",
    }
}

/// Print the startup banner, falling back to the plain name on narrow or
/// non-terminal outputs.
pub fn print() {
    let columns = crossterm::terminal::size().ok().map(|(columns, _)| columns);
    println!("{}", banner_for_width(columns).magenta());
}
