use crate::coach::SwimmerSnapshot;
use crate::format::{format_optional, format_pace_per_100, format_seconds, summary_pace_cell};
use crate::metrics;
use crate::models::SessionSummary;
use crate::pace::short_date_label;
use crate::reps::SetRepPoint;
use crate::rpe::RpeBucket;
use crate::stroke_mix::StrokeShare;
use crate::views::{DashboardView, SessionDetailView, SessionsView};

const BAR_WIDTH: usize = 30;

fn bar(value: f64, max: f64) -> String {
    if !(max > 0.0 && value.is_finite()) {
        return String::new();
    }
    let n = ((value / max) * BAR_WIDTH as f64).round().clamp(0.0, BAR_WIDTH as f64) as usize;
    "#".repeat(n)
}

fn date_cell(s: &SessionSummary) -> String {
    s.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into())
}

pub fn print_sessions_table(rows: &[SessionSummary]) {
    if rows.is_empty() {
        println!("(no sessions)");
        return;
    }
    println!("{:<10} {:<12} {:>9} {:>16} {:>7}  notes", "id", "date", "distance", "avg pace", "rpe");
    for s in rows {
        println!(
            "{:<10} {:<12} {:>9} {:>16} {:>7}  {}",
            s.id,
            date_cell(s),
            format_optional(s.total_distance_m, 0),
            summary_pace_cell(s),
            format_optional(s.avg_rpe, 1),
            s.notes.as_deref().unwrap_or(""),
        );
    }
}

pub fn print_rpe_buckets(buckets: &[RpeBucket]) {
    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    for b in buckets {
        println!("  {:<5} {:>3} {}", b.bucket.label(), b.count, bar(b.count as f64, max));
    }
}

pub fn print_stroke_mix(mix: &[StrokeShare]) {
    if mix.is_empty() {
        println!("  (no stroke data)");
        return;
    }
    for s in mix {
        println!("  {:<8} {:>5.1}% {}", s.stroke, s.percent, bar(s.percent, 100.0));
    }
}

pub fn print_sessions_view(view: &SessionsView) {
    print_sessions_table(&view.rows);

    println!();
    println!("--- Pace per 100 m ---");
    if view.pace.is_empty() {
        println!("  (no pace data)");
    }
    for p in &view.pace {
        println!("  {:<7} {}", p.date_label, format_pace_per_100(p.pace_per_100));
    }

    println!();
    println!("--- RPE ---");
    print_rpe_buckets(&view.rpe);
}

pub fn print_dashboard(view: &DashboardView) {
    println!("--- Sessions ({}) ---", view.sessions.rows.len());
    print_sessions_view(&view.sessions);
    println!();
    println!("--- Stroke mix ---");
    print_stroke_mix(&view.stroke_mix);
}

/// "#1 1:05  #3 1:07"; `None` for et sett uten registrerte tider.
pub fn set_reps_line(reps: &[SetRepPoint]) -> Option<String> {
    if reps.is_empty() {
        return None;
    }
    let cells: Vec<String> = reps.iter().map(|r| format!("{} {}", r.rep, format_seconds(r.sec))).collect();
    Some(cells.join("  "))
}

pub fn print_session_detail(view: &SessionDetailView) {
    println!("--- Session {} ({}) ---", view.id, short_date_label(view.date));
    println!("{}", view.notes.as_deref().unwrap_or("No notes"));
    println!("Total distance: {:.0} m", view.total_distance_m);
    println!("Avg pace:       {}", view.avg_pace);
    println!("Avg RPE:        {}", format_optional(view.avg_rpe, 2));
    println!("Best set:       {}", view.best_set.as_deref().unwrap_or("-"));

    println!();
    println!("--- Sets ---");
    for (i, row) in view.sets.iter().enumerate() {
        let name = row.name.as_deref().map(|n| format!(" ({n})")).unwrap_or_default();
        let pace = row.pace_per_100_sec.map(format_pace_per_100).unwrap_or_else(|| "-".into());
        println!(
            "  {:>2}. {}{}  pace {}  rpe {}",
            row.number,
            row.prescription,
            name,
            pace,
            format_optional(row.avg_rpe, 1)
        );
        if let Some(line) = view.set_reps.get(i).and_then(|reps| set_reps_line(reps)) {
            println!("      {line}");
        }
    }

    println!();
    println!("--- Rep times ---");
    let max = view.reps.iter().map(|r| r.sec).fold(0.0, f64::max);
    for r in &view.reps {
        let rpe = r.rpe.map(|v| format!("  rpe {v}")).unwrap_or_default();
        println!("  {:<8} {:>7} {}{}", r.x, format_seconds(r.sec), bar(r.sec, max), rpe);
    }

    println!();
    println!("--- Distance by stroke ---");
    for s in &view.stroke_distances {
        println!("  {:<8} {:>6.0} m", s.stroke, s.distance_m);
    }

    println!();
    println!("--- RPE ---");
    print_rpe_buckets(&view.rpe);
}

pub fn print_coach_overview(rows: &[SwimmerSnapshot]) {
    println!("--- Swimmers ({}) ---", rows.len());
    println!("{:<10} {:<24} {:<12} {:>10}", "id", "swimmer", "last", "14d (m)");
    for r in rows {
        let last = r.last_date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_else(|| "-".into());
        println!("{:<10} {:<24} {:<12} {:>10.0}", r.swimmer_id, r.name, last, r.volume_14d);
    }
}

pub fn print_metrics() {
    println!("{}", metrics::global().render());
}
