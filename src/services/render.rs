use minijinja::{context, Environment};
use serde::Serialize;

use crate::models::mood::{Mood, MoodOption, NOTE_MAX_CHARS};
use crate::services::dashboard::DashboardView;

const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");

const CHART_WIDTH: u32 = 500;
const CHART_HEIGHT: u32 = 260;
const LABEL_BAND: u32 = 50;
const BAR_GAP: u32 = 20;

/// One bar of the SVG chart, geometry precomputed for the template.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartBar {
    pub emoji: &'static str,
    pub label: &'static str,
    pub count: usize,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Flash {
    pub kind: &'static str,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: "success",
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: "warning",
            message: message.into(),
        }
    }
}

pub fn chart_bars(view: &DashboardView) -> Vec<ChartBar> {
    let slots = Mood::ALL.len() as u32;
    let slot_width = CHART_WIDTH / slots;
    let max = view.counts.iter().map(|(_, c)| c).max().unwrap_or(0).max(1);
    let plot_height = CHART_HEIGHT - LABEL_BAND;

    view.counts
        .iter()
        .enumerate()
        .map(|(i, (mood, count))| {
            let height = (count as u64 * plot_height as u64 / max as u64) as u32;
            ChartBar {
                emoji: mood.emoji(),
                label: mood.label(),
                count,
                x: i as u32 * slot_width + BAR_GAP / 2,
                y: plot_height - height,
                width: slot_width - BAR_GAP,
                height,
            }
        })
        .collect()
}

pub fn render_dashboard(
    view: Option<&DashboardView>,
    flash: Option<&Flash>,
    refresh_secs: u64,
) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("dashboard.html", DASHBOARD_TEMPLATE)?;
    let template = env.get_template("dashboard.html")?;

    let moods: Vec<MoodOption> = Mood::ALL.into_iter().map(MoodOption::from).collect();
    let bars = view.map(chart_bars).unwrap_or_default();

    template.render(context! {
        moods => moods,
        note_max => NOTE_MAX_CHARS,
        view => view,
        bars => bars,
        flash => flash,
        refresh_secs => refresh_secs,
        chart_width => CHART_WIDTH,
        chart_height => CHART_HEIGHT,
        label_y => CHART_HEIGHT - LABEL_BAND / 3,
    })
}
