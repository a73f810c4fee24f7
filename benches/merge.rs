use criterion::{black_box, criterion_group, criterion_main, Criterion};
use polars::prelude::*;
use weather_archive::merge_tables;

const CITIES: [&str; 4] = ["Shenzhen", "Shanghai", "Guangzhou", "Beijing"];

/// One single-row frame per city and day, with every third day missing a
/// column and every tenth day repeated.
fn day_frames(days: u32) -> Vec<DataFrame> {
    let mut frames = Vec::new();
    for day in 0..days {
        let date = format!("2024-{:02}-{:02}", 1 + day / 28, 1 + day % 28);
        for city in CITIES {
            let mut columns = vec![
                Column::new("city_name".into(), [city]),
                Column::new("date".into(), [date.as_str()]),
                Column::new("temperature_max".into(), [format!("{}.5", 25 + day % 10)]),
                Column::new("humidity_afternoon".into(), ["61"]),
            ];
            if day % 3 != 0 {
                columns.push(Column::new("precipitation_total".into(), ["0.4"]));
            }
            if let Ok(df) = DataFrame::new(columns) {
                if day % 10 == 0 {
                    frames.push(df.clone());
                }
                frames.push(df);
            }
        }
    }
    frames
}

fn bench_merge(c: &mut Criterion) {
    let month = day_frames(29);
    let year = day_frames(336);
    c.bench_function("merge_tables_month", |b| {
        b.iter(|| merge_tables(black_box(month.clone())))
    });
    c.bench_function("merge_tables_year", |b| {
        b.iter(|| merge_tables(black_box(year.clone())))
    });
}

criterion_group!(benches, bench_merge);
criterion_main!(benches);
