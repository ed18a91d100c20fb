use chrono::TimeZone;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    core::{
        flow::FlowSet,
        prices::{PriceEntry, cheap_threshold},
    },
    quantity::energy::KilowattHours,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table
}

pub fn build_flow_table(flow: &FlowSet) -> Table {
    let row = |label: &str, value: KilowattHours, color: Color| {
        vec![
            Cell::new(label).fg(color),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]
    };
    let diagnostic = |label: &str, value: KilowattHours| {
        vec![
            Cell::new(label).add_attribute(Attribute::Dim),
            Cell::new(value).set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
        ]
    };

    let mut table = new_table();
    table.set_header(vec!["Flow", "Energy"]);
    table.add_row(row("PV", flow.pv, Color::Green));
    table.add_row(row("PV auto-consume", flow.pv_auto_consume, Color::Green));
    table.add_row(row("Charge", flow.charge, Color::Cyan));
    table.add_row(row("Discharge", flow.discharge, Color::Blue));
    table.add_row(row("Feed-in", flow.feed_in, Color::Magenta));
    table.add_row(row("Grid consumption", flow.grid_consumption, Color::Red));
    table.add_row(row("Load", flow.load, Color::DarkYellow));
    table.add_row(row("Calculated load", flow.calculated_load, Color::DarkYellow));
    table.add_row(diagnostic("PV waste", flow.pv_waste));
    table.add_row(diagnostic("Grid waste", flow.grid_waste));
    table.add_row(diagnostic("Δ load", flow.delta_load));
    table
}

pub fn build_prices_table<Tz: TimeZone>(entries: &[PriceEntry], local_tz: &Tz) -> Table
where
    Tz::Offset: std::fmt::Display,
{
    let threshold = cheap_threshold(entries);
    let mut table = new_table();
    table.set_header(vec!["Start", "End", "Price"]);
    for entry in entries {
        let cheap = threshold.is_some_and(|threshold| entry.rate.0 < threshold.0);
        table.add_row(vec![
            Cell::new(entry.period.start.with_timezone(local_tz).format("%H:%M")),
            Cell::new(entry.period.end.with_timezone(local_tz).format("%H:%M"))
                .add_attribute(Attribute::Dim),
            Cell::new(entry.rate)
                .set_alignment(CellAlignment::Right)
                .fg(if cheap { Color::Green } else { Color::Red }),
        ]);
    }
    table
}

pub fn build_forecast_table(
    forecast: &[KilowattHours; 24],
    actual: &[KilowattHours; 24],
) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Hour", "Forecast", "Actual"]);
    for (hour, (forecast, actual)) in forecast.iter().zip(actual).enumerate() {
        if (forecast.0 == 0.0) && (actual.0 == 0.0) {
            continue;
        }
        table.add_row(vec![
            Cell::new(format!("{hour:02}:00")).add_attribute(Attribute::Dim),
            Cell::new(forecast).set_alignment(CellAlignment::Right),
            Cell::new(actual).set_alignment(CellAlignment::Right).fg(if actual >= forecast {
                Color::Green
            } else {
                Color::DarkYellow
            }),
        ]);
    }
    table
}
