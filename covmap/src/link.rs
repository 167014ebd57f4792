use crate::options::{Link, LinkFormat};
use anyhow::Result;
use coverage::propah::{LinkMargin, Point2Point};
use rastergrid::Dataset;
use serde::Serialize;
use std::io::Write;
use textplots::{Chart, Plot, Shape};

impl Link {
    pub fn run(&self, dataset: &Dataset) -> Result<()> {
        let radio = &self.radio;
        let p2p = Point2Point::builder()
            .freq(radio.freq)
            .start(self.tx.0)
            .start_alt(radio.tx_alt)
            .step_size(radio.step)
            .end(self.rx.0)
            .end_alt(radio.rx_alt)
            .tx_power(radio.tx_power)
            .rx_threshold(radio.rx_threshold)
            .reliability(radio.reliability)
            .foliage_spacing(radio.foliage_spacing())
            .build(&dataset.grids)?;

        let mut stdout = std::io::stdout().lock();
        match self.format {
            LinkFormat::Csv => print_csv(&mut stdout, &p2p)?,
            LinkFormat::Json => print_json(&mut stdout, &p2p)?,
            LinkFormat::Plot => plot_ascii(&p2p),
            LinkFormat::Summary => print_summary(&mut stdout, &p2p, radio.reliability)?,
        };
        Ok(())
    }
}

/// # Example with gnuplot
///
/// ```sh
/// covmap -d data link --tx=2785000,8435000 --rx=2786500,8434200 csv | tr ',' ' ' > /tmp/plot && gnuplot -p -e "plot for [col=2:4] '/tmp/plot' using 1:col with lines"
/// ```
fn print_csv<W: Write>(out: &mut W, p2p: &Point2Point) -> Result<()> {
    writeln!(out, "Distance,Elevation,LOS,Fresnel")?;
    for (((distance, elevation), los), fresnel) in p2p
        .distances_m
        .iter()
        .zip(p2p.terrain_elev_m.iter())
        .zip(p2p.los_elev_m.iter())
        .zip(p2p.fresnel_zone_m.iter())
    {
        writeln!(out, "{distance},{elevation},{los},{fresnel}")?;
    }
    Ok(())
}

fn print_json<W: Write>(out: &mut W, p2p: &Point2Point) -> Result<()> {
    #[derive(Serialize)]
    struct JsonEntry {
        distance: f64,
        elevation: f64,
        los: f64,
        fresnel: f64,
    }

    #[derive(Serialize)]
    struct JsonLink {
        distance_m: f64,
        diffraction_loss_db: f64,
        foliage_loss_db: f64,
        margin: LinkMargin,
        profile: Vec<JsonEntry>,
    }

    let profile = p2p
        .points()
        .zip(p2p.los_elev_m.iter())
        .zip(p2p.fresnel_zone_m.iter())
        .map(|((point, los), fresnel)| JsonEntry {
            distance: point.distance_m,
            elevation: point.height_m,
            los: *los,
            fresnel: *fresnel,
        })
        .collect();
    let json = serde_json::to_string(&JsonLink {
        distance_m: p2p.distance_m,
        diffraction_loss_db: p2p.diffraction_loss_db,
        foliage_loss_db: p2p.foliage_loss_db,
        margin: p2p.margin,
        profile,
    })?;
    writeln!(out, "{json}")?;
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn plot_ascii(p2p: &Point2Point) {
    let terrain: Vec<(f32, f32)> = p2p
        .points()
        .map(|point| (point.distance_m as f32, point.height_m as f32))
        .collect();
    let los: Vec<(f32, f32)> = p2p
        .distances_m
        .iter()
        .zip(p2p.los_elev_m.iter())
        .map(|(d, h)| (*d as f32, *h as f32))
        .collect();
    let xmax = p2p.distances_m.last().copied().unwrap_or(0.0) as f32;
    Chart::new(300, 150, 0.0, xmax)
        .lineplot(&Shape::Lines(&terrain))
        .lineplot(&Shape::Lines(&los))
        .display();
}

fn print_summary<W: Write>(out: &mut W, p2p: &Point2Point, reliability_db: f64) -> Result<()> {
    let LinkMargin {
        fspl_db,
        total_loss_db,
        rx_dbm,
        margin_db,
    } = p2p.margin;
    writeln!(out, "distance:    {:>9.1} m", p2p.distance_m)?;
    writeln!(out, "samples:     {:>9}", p2p.distances_m.len())?;
    writeln!(out, "free space:  {fspl_db:>9.2} dB")?;
    writeln!(out, "diffraction: {:>9.2} dB", p2p.diffraction_loss_db)?;
    writeln!(out, "foliage:     {:>9.2} dB", p2p.foliage_loss_db)?;
    writeln!(out, "reliability: {reliability_db:>9.2} dB")?;
    writeln!(out, "total loss:  {total_loss_db:>9.2} dB")?;
    writeln!(out, "received:    {rx_dbm:>9.2} dBm")?;
    writeln!(out, "margin:      {margin_db:>9.2} dB")?;
    Ok(())
}
