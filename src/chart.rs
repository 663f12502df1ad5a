// src/chart.rs
//
// Live TDS chart (plotters via plotters-iced).

use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::ShapeStyle;
use plotters_iced::{Chart, DrawingBackend};

use tds_monitor::Sample;

use crate::Message;

const INK: RGBColor = RGBColor(0x13, 0x14, 0x14);
const THRESHOLD_RED: RGBColor = RGBColor(0xD9, 0x53, 0x4F);

/// Upper y bound: room above the highest point, never below 1024 ppm or just
/// above the threshold line.
pub fn y_limit(max_ppm: f64, threshold: f64) -> f64 {
    (max_ppm * 1.2).max(1024.0).max(threshold * 1.1)
}

pub struct TdsChart<'a> {
    pub points: &'a [Sample],
    pub max_ppm: f64,
    pub threshold: f64,
}

impl<'a> Chart<Message> for TdsChart<'a> {
    type State = ();

    fn build_chart<DB: DrawingBackend>(
        &self,
        _state: &Self::State,
        mut builder: plotters_iced::ChartBuilder<DB>,
    ) {
        let n = self.points.len().max(1);
        let x_max = (n - 1).max(1) as f64;
        let y_max = y_limit(self.max_ppm, self.threshold);

        let Ok(mut chart) = builder
            .caption("TDS concentration (ppm)", ("sans-serif", 20))
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, 60)
            .set_label_area_size(LabelAreaPosition::Bottom, 40)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
        else {
            log::error!("chart layout failed");
            return;
        };

        if let Err(e) = chart
            .configure_mesh()
            .x_desc("Recent samples")
            .y_desc("TDS (ppm)")
            .axis_desc_style(("sans-serif", 15))
            .light_line_style(RGBColor(0xCC, 0xCC, 0xCC).mix(0.6))
            .draw()
        {
            log::debug!("chart mesh: {e}");
        }

        let series: Vec<(f64, f64)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, s)| (i as f64, s.ppm()))
            .collect();

        if let Err(e) = chart.draw_series(
            AreaSeries::new(series.iter().copied(), 0.0, INK.mix(0.15))
                .border_style(ShapeStyle::from(&INK).stroke_width(3)),
        ) {
            log::debug!("chart series: {e}");
        }

        if let Some(&(x, y)) = series.last() {
            if let Err(e) =
                chart.draw_series(std::iter::once(Circle::new((x, y), 5, INK.filled())))
            {
                log::debug!("chart marker: {e}");
            }
        }

        if let Err(e) = chart.draw_series(DashedLineSeries::new(
            vec![(0.0, self.threshold), (x_max, self.threshold)],
            8,
            5,
            ShapeStyle::from(&THRESHOLD_RED).stroke_width(2),
        )) {
            log::debug!("chart threshold line: {e}");
        }

        let label_style = TextStyle::from(("sans-serif", 13).into_font()).color(&THRESHOLD_RED);
        if let Err(e) = chart.draw_series(std::iter::once(Text::new(
            format!("Threshold ({})", self.threshold),
            (x_max * 0.80, self.threshold * 1.05),
            label_style,
        ))) {
            log::debug!("chart threshold label: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn y_limit_floor_and_headroom() {
        assert_eq!(y_limit(0.0, 500.0), 1024.0);
        assert_eq!(y_limit(1000.0, 500.0), 1200.0);
        assert_eq!(y_limit(10.0, 2000.0), 2000.0 * 1.1);
    }

    #[test]
    fn y_limit_follows_buffer_peak() {
        let mut buf = tds_monitor::RollingBuffer::new(4);
        buf.insert(Sample::new(1500.0));
        buf.insert(Sample::new(900.0));
        assert_eq!(y_limit(buf.max_ppm(), 500.0), 1800.0);
        buf.reset();
        assert_eq!(y_limit(buf.max_ppm(), 500.0), 1024.0);
    }

    #[test]
    fn renders_into_svg_without_panicking() {
        let points = vec![Sample::ZERO, Sample::new(300.0), Sample::new(640.0)];
        let chart = TdsChart {
            points: &points,
            max_ppm: 640.0,
            threshold: 500.0,
        };
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (480, 320)).into_drawing_area();
            chart.build_chart(&(), ChartBuilder::on(&root));
        }
        assert!(svg.contains("<svg"));
    }
}
