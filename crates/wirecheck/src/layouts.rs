use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use itertools::Itertools;

use crate::setup::ConfigArgs;

#[derive(Args, Debug, Default, Clone)]
#[command(about = "List the layouts of a tester configuration")]
pub struct LayoutsArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Also print the pin label table
    #[arg(short = 'p', long = "pins")]
    pub pins: bool,
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).fg(Color::Blue).add_attribute(Attribute::Bold))
        .collect()
}

pub fn execute(args: LayoutsArgs) -> Result<()> {
    let config = args.config.load()?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(header(&["#", "Layout", "Nets"]));

    for (index, layout) in config.layouts.iter().enumerate() {
        let nets = layout
            .nets
            .iter()
            .map(|net| net.label.replace(config.tester.label_separator, " "))
            .join(", ");
        table.add_row(vec![
            Cell::new(index + 1),
            Cell::new(&layout.name),
            Cell::new(nets),
        ]);
    }

    println!("{table}");

    if args.pins {
        let mut pins = Table::new();
        pins.load_preset(UTF8_FULL_CONDENSED);
        pins.set_header(header(&["Pin", "Channel"]));
        for (label, channel) in config.pin_table().iter().sorted_by_key(|(_, channel)| *channel) {
            pins.add_row(vec![Cell::new(label), Cell::new(channel)]);
        }
        println!("{pins}");
    }

    Ok(())
}
