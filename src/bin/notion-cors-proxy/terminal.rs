use anyhow::Result;
use itertools::Itertools;
use std::collections::HashMap;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub(crate) fn print_urls(map: &HashMap<&str, String>) -> Result<()> {
    let length = map.keys().map(|name| name.len() + 5).max().unwrap_or(0);

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(stdout, "\n  notion-cors-proxy ")?;

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(false))?;
    write!(stdout, "v{}", env!("CARGO_PKG_VERSION"))?;

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::White)))?;
    writeln!(stdout, "   press ctrl + c to shutdown\n")?;

    for (name, url) in map.iter().sorted_by(|(a, _), (b, _)| a.cmp(b)) {
        stdout.set_color(ColorSpec::new().set_fg(Some(Color::White)).set_bold(true))?;
        write!(stdout, "  {:width$}", name, width = length)?;

        stdout.set_color(ColorSpec::new().set_fg(Some(Color::White)).set_bold(false))?;
        writeln!(stdout, "  {}", url)?;
    }

    stdout.reset()?;
    writeln!(stdout)?;
    Ok(())
}
