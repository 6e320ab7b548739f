//! SVG charts of the analysis results and the stimulation waveform
//!
//! Drawn with plotters into an in-memory SVG string. Text sizes come from
//! plotters' built-in estimator, so no system fonts are needed. Subjects are
//! labelled `Subject 1`, `Subject 2`, ... in analysis order.

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::error::Error;

use crate::config::WaveformConfig;
use crate::error::{AnalysisError, Result};
use crate::group::GroupResult;
use crate::subject::SubjectResult;
use crate::waveform::Waveform;

pub const ANALYSIS_CHART_FILE_NAME: &str = "reaction_time_analysis.svg";
pub const TRIALS_CHART_FILE_NAME: &str = "individual_trials.svg";
pub const WAVEFORM_CHART_FILE_NAME: &str = "ems_waveform.svg";

type DrawResult = std::result::Result<(), Box<dyn Error>>;

const BASELINE_COLOR: RGBColor = RGBColor(0xe7, 0x4c, 0x3c);
const PHASE1_COLOR: RGBColor = RGBColor(0x34, 0x98, 0xdb);
const PHASE2_COLOR: RGBColor = RGBColor(0x2e, 0xcc, 0x71);
const NEUTRAL_COLOR: RGBColor = RGBColor(0x95, 0xa5, 0xa6);
const TRACE_COLOR: RGBColor = RGBColor(0x2c, 0x3e, 0x50);

const PHASE_LABELS: [&str; 3] = ["Baseline", "After phase 1", "After phase 2"];
const PHASE_COLORS: [RGBColor; 3] = [BASELINE_COLOR, PHASE1_COLOR, PHASE2_COLOR];

fn subject_label(index: usize) -> String {
    format!("Subject {}", index + 1)
}

/// Label for an integer tick inside `0..count`, empty elsewhere
fn category_tick(x: f64, count: usize, label: impl Fn(usize) -> String) -> String {
    let i = x.round();
    if (x - i).abs() < 1e-9 && i >= 0.0 && (i as usize) < count {
        label(i as usize)
    } else {
        String::new()
    }
}

/// Value range with 10% headroom on both sides
fn padded_range(values: impl IntoIterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return -1.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.1 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

fn render<F>(size: (u32, u32), draw: F) -> Result<String>
where
    F: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> DrawResult,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw(&root)
            .and_then(|()| Ok(root.present()?))
            .map_err(|e| AnalysisError::Render(e.to_string()))?;
    }
    Ok(svg)
}

fn require_subjects(subjects: &[SubjectResult]) -> Result<()> {
    if subjects.is_empty() {
        return Err(AnalysisError::DataInsufficient {
            context: "charts (subjects)".to_string(),
            required: 1,
            actual: 0,
        });
    }
    Ok(())
}

fn horizontal_rule<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    x: &std::ops::Range<f64>,
    y: f64,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    chart.draw_series(std::iter::once(PathElement::new(vec![(x.start, y), (x.end, y)], BLACK.stroke_width(1))))?;
    Ok(())
}

fn draw_subject_means<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, subjects: &[SubjectResult]) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let means: Vec<[f64; 3]> = subjects
        .iter()
        .map(|s| [s.baseline.mean, s.phase1.mean, s.phase2.mean])
        .collect();
    let y = padded_range(means.iter().flatten().copied());

    let mut chart = ChartBuilder::on(area)
        .caption("(a) Mean reaction time per subject", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..2.5f64, y)?;

    let tick = |x: &f64| category_tick(*x, 3, |i| PHASE_LABELS[i].to_string());
    chart
        .configure_mesh()
        .x_labels(3)
        .x_label_formatter(&tick)
        .y_desc("Mean reaction time (ms)")
        .draw()?;

    for (i, m) in means.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        let points: Vec<(f64, f64)> = m.iter().enumerate().map(|(x, v)| (x as f64, *v)).collect();
        chart
            .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
            .label(subject_label(i))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 5, color.filled())))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_group_change<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, group: &GroupResult) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let bars = [
        (0.0, 0.0),
        (group.change_p1.mean, group.change_p1.sd.unwrap_or(0.0)),
        (group.change_p2.mean, group.change_p2.sd.unwrap_or(0.0)),
    ];
    let y = padded_range(bars.iter().flat_map(|(m, sd)| [0.0, m - sd, m + sd]));
    let label_offset = (y.end - y.start) * 0.06;
    let x = -0.5f64..2.5f64;

    let mut chart = ChartBuilder::on(area)
        .caption("(b) Group mean change from baseline", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x.clone(), y.start..(y.end + label_offset))?;

    let tick = |x: &f64| category_tick(*x, 3, |i| PHASE_LABELS[i].to_string());
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(3)
        .x_label_formatter(&tick)
        .y_desc("Reduction from baseline (ms)")
        .draw()?;

    let colors = [NEUTRAL_COLOR, PHASE1_COLOR, PHASE2_COLOR];
    chart.draw_series(bars.iter().enumerate().map(|(i, (m, _))| {
        let c = i as f64;
        Rectangle::new([(c - 0.3, 0.0), (c + 0.3, *m)], colors[i].mix(0.8).filled())
    }))?;

    for (i, (m, sd)) in bars.iter().enumerate().filter(|(_, (_, sd))| *sd > 0.0) {
        let c = i as f64;
        let (lo, hi) = (m - sd, m + sd);
        chart.draw_series([
            PathElement::new(vec![(c, lo), (c, hi)], BLACK.stroke_width(1)),
            PathElement::new(vec![(c - 0.08, lo), (c + 0.08, lo)], BLACK.stroke_width(1)),
            PathElement::new(vec![(c - 0.08, hi), (c + 0.08, hi)], BLACK.stroke_width(1)),
        ])?;
    }

    chart.draw_series(bars.iter().enumerate().filter(|(_, (m, _))| *m != 0.0).map(|(i, (m, sd))| {
        Text::new(
            format!("{:+.1}ms", m),
            (i as f64 - 0.2, m.max(m + sd) + label_offset),
            ("sans-serif", 15).into_font(),
        )
    }))?;

    horizontal_rule(&mut chart, &x, 0.0)
}

fn draw_subject_changes<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    subjects: &[SubjectResult],
    reference_ms: f64,
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let n = subjects.len();
    let y = padded_range(
        subjects
            .iter()
            .flat_map(|s| [s.change_p1, s.change_p2])
            .chain([0.0, reference_ms]),
    );
    let x = -0.6f64..(n as f64 - 0.4);

    let mut chart = ChartBuilder::on(area)
        .caption("(c) Change from baseline per subject", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x.clone(), y)?;

    let tick = |x: &f64| category_tick(*x, n, subject_label);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&tick)
        .y_desc("Reduction from baseline (ms)")
        .draw()?;

    let width = 0.35;
    for (label, color, offset, second) in [
        ("After phase 1", PHASE1_COLOR, -width, false),
        ("After phase 2", PHASE2_COLOR, 0.0, true),
    ] {
        let fill = color.mix(0.8);
        chart
            .draw_series(subjects.iter().enumerate().map(|(i, s)| {
                let left = i as f64 + offset;
                let change = if second { s.change_p2 } else { s.change_p1 };
                Rectangle::new([(left, 0.0), (left + width, change)], fill.filled())
            }))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled()));
    }

    horizontal_rule(&mut chart, &x, 0.0)?;

    let reference = RED.mix(0.6);
    chart
        .draw_series(DashedLineSeries::new(
            vec![(x.start, reference_ms), (x.end, reference_ms)],
            10,
            6,
            reference.stroke_width(1),
        ))?
        .label(format!("Prior work ({} ms)", reference_ms))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], reference));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Three-panel summary: per-subject means, group change, per-subject change
///
/// The dashed reference line in the third panel marks the improvement
/// reported in prior work (`interpretation.literature_reference_ms`).
pub fn render_analysis_chart(subjects: &[SubjectResult], group: &GroupResult) -> Result<String> {
    require_subjects(subjects)?;
    let reference_ms = group.interpretation.literature_reference_ms;

    render((1800, 600), |root| {
        root.fill(&WHITE)?;
        let panels = root.split_evenly((1, 3));
        draw_subject_means(&panels[0], subjects)?;
        draw_group_change(&panels[1], group)?;
        draw_subject_changes(&panels[2], subjects, reference_ms)
    })
}

fn draw_trials<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, index: usize, subject: &SubjectResult) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let series = [
        (&subject.baseline_series.values, subject.baseline.mean),
        (&subject.phase1_series.values, subject.phase1.mean),
        (&subject.phase2_series.values, subject.phase2.mean),
    ];
    let longest = series.iter().map(|(v, _)| v.len()).max().unwrap_or(0);
    let x = 0.0f64..(longest as f64 + 1.0);
    let y = padded_range(series.iter().flat_map(|(v, _)| v.iter().copied()));

    let mut chart = ChartBuilder::on(area)
        .caption(subject_label(index), ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x.clone(), y)?;

    chart
        .configure_mesh()
        .x_desc("Trial")
        .y_desc("Reaction time (ms)")
        .draw()?;

    for (((values, mean), label), color) in series.iter().zip(PHASE_LABELS).zip(PHASE_COLORS) {
        chart
            .draw_series(
                values
                    .iter()
                    .enumerate()
                    .map(|(k, v)| Circle::new(((k + 1) as f64, *v), 4, color.mix(0.7).filled())),
            )?
            .label(label)
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
        chart.draw_series(DashedLineSeries::new(
            vec![(x.start, *mean), (x.end, *mean)],
            8,
            5,
            color.mix(0.5).stroke_width(1),
        ))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Every cleaned trial of every subject, one panel per subject
pub fn render_trials_chart(subjects: &[SubjectResult]) -> Result<String> {
    require_subjects(subjects)?;
    let width = 600 * u32::try_from(subjects.len()).unwrap_or(u32::MAX / 600);

    render((width, 500), |root| {
        root.fill(&WHITE)?;
        for (i, (panel, subject)) in root.split_evenly((1, subjects.len())).iter().zip(subjects).enumerate() {
            draw_trials(panel, i, subject)?;
        }
        Ok(())
    })
}

/// Step outline of the samples: each holds its amplitude for one time step
fn step_points(waveform: &Waveform, dt: f64, until_us: u64) -> Vec<(f64, f64)> {
    waveform
        .samples
        .iter()
        .take_while(|s| s.time_us < until_us)
        .flat_map(|s| {
            let t = s.time_us as f64;
            let a = f64::from(s.amplitude);
            [(t, a), (t + dt, a)]
        })
        .collect()
}

fn draw_waveform_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    caption: &str,
    points: &[(f64, f64)],
    x: std::ops::Range<f64>,
    separators: &[f64],
) -> DrawResult
where
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x.clone(), -1.5f64..1.5f64)?;

    chart
        .configure_mesh()
        .x_desc("Time (µs)")
        .y_desc("Voltage (normalised)")
        .draw()?;

    for (label, color, positive) in [("Anodic (+)", BASELINE_COLOR, true), ("Cathodic (-)", PHASE1_COLOR, false)] {
        let fill = color.mix(0.3);
        let part = points
            .iter()
            .map(move |&(t, a)| (t, if positive { a.max(0.0) } else { a.min(0.0) }));
        chart
            .draw_series(AreaSeries::new(part, 0.0, fill))?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled()));
    }

    chart.draw_series(separators.iter().map(|&t| {
        PathElement::new(vec![(t, -1.4), (t, 1.4)], NEUTRAL_COLOR.mix(0.6).stroke_width(1))
    }))?;
    chart.draw_series(LineSeries::new(points.iter().copied(), TRACE_COLOR.stroke_width(2)))?;
    horizontal_rule(&mut chart, &x, 0.0)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Two panels: the whole stimulus with cycle boundaries, and one cycle
pub fn render_waveform_chart(waveform: &Waveform, config: &WaveformConfig) -> Result<String> {
    let dt = f64::from(config.dt_us);
    let total = waveform.total_us as f64;
    let whole = step_points(waveform, dt, waveform.total_us);
    let cycle = step_points(waveform, dt, waveform.cycle_us);

    let pulse_span = waveform.pulse_us + u64::from(config.pulse_interval_us);
    let separators: Vec<f64> = (0..u64::from(config.pulse_count))
        .flat_map(|p| (1..u64::from(config.burst_count)).map(move |k| (p * pulse_span + k * waveform.cycle_us) as f64))
        .collect();

    let whole_caption = format!(
        "(a) Whole stimulus ({} cycles x {} pulse(s) = {} µs)",
        config.burst_count, config.pulse_count, waveform.total_us
    );
    let cycle_caption = format!(
        "(b) One cycle: {} µs per phase, {} µs per cycle",
        config.pulse_width_us, waveform.cycle_us
    );

    render((1400, 800), |root| {
        root.fill(&WHITE)?;
        let panels = root.split_evenly((2, 1));
        draw_waveform_panel(&panels[0], &whole_caption, &whole, -20.0..(total + 50.0), &separators)?;
        draw_waveform_panel(
            &panels[1],
            &cycle_caption,
            &cycle,
            -5.0..(waveform.cycle_us as f64 + 5.0),
            &[],
        )
    })
}
