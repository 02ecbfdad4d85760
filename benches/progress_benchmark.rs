use chrono::{Days, NaiveDate};
use criterion::{criterion_group, criterion_main, Criterion};
use habit_tracker::models::{Habit, ProgressStats};
use habit_tracker::services::recommend;
use habit_tracker::time_utils::date_key;
use std::hint::black_box;

const NAMES: &[&str] = &[
    "Drink water",
    "Morning run",
    "Read 20 pages",
    "Meditate",
    "Sleep by 11",
    "Practice guitar",
    "Call a friend",
    "Stretch",
];

/// `count` habits, each completed on most of the last `history_days` days.
fn make_habits(count: usize, history_days: u64, today: NaiveDate) -> Vec<Habit> {
    (0..count)
        .map(|i| {
            let name = NAMES[i % NAMES.len()];
            let mut habit = Habit::new("bench-user", name, None, "2025-01-01T00:00:00Z".into());
            for offset in 0..history_days {
                // Skip every (i + 3)th day so streaks vary between habits
                if offset % (i as u64 + 3) == 2 {
                    continue;
                }
                if let Some(day) = today.checked_sub_days(Days::new(offset)) {
                    habit.completed_dates.insert(date_key(day));
                }
            }
            habit
        })
        .collect()
}

fn benchmark_progress(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2026, 6, 15).expect("valid date");

    let typical = make_habits(8, 90, today);
    let heavy = make_habits(50, 730, today);

    let mut group = c.benchmark_group("progress_stats");

    group.bench_function("typical_user", |b| {
        b.iter(|| ProgressStats::compute(black_box(&typical), today))
    });

    group.bench_function("two_years_fifty_habits", |b| {
        b.iter(|| ProgressStats::compute(black_box(&heavy), today))
    });

    group.bench_function("recommendations", |b| {
        let stats = ProgressStats::compute(&typical, today);
        b.iter(|| recommend(black_box(&typical), black_box(&stats)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_progress);
criterion_main!(benches);
