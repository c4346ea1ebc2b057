//! Benchmarks for stream resolution over player pages of varying size.
//!
//! Run with: `cargo bench --bench resolver_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dafilms::stream::unwrap_player_response;
use dafilms::StreamResolver;

const PLAYER_URL: &str = "https://dafilms.cz/film/42/player";

/// Build a film page of roughly `target_bytes`, with the player markup at
/// the end so every strategy walks the whole document.
fn generate_page(target_bytes: usize, player: &str) -> String {
    let header = r#"<!DOCTYPE html>
<html lang="cs">
<head><meta charset="UTF-8"><title>DAFilms</title>
<link rel="stylesheet" href="/css/app.css"><script src="/js/app.js"></script></head>
<body>
<nav><ul><li><a href="/film">Filmy</a></li><li><a href="/collection">Kolekce</a></li></ul></nav>
<main>
"#;
    let card = r#"<li data-film-item="true"><a class="ui-movie-card__link" href="/film/101-kameny" style="background-image: url('https://img.dafilms.cz/101.jpg')"><span class="ui-movie-card__link--title">Kameny</span></a></li>
"#;
    let paragraph = "<p>Dokumentární film o krajině, paměti a lidech, kteří v ní žijí.</p>\n";

    let mut html = String::with_capacity(target_bytes + player.len() + 1024);
    html.push_str(header);
    let blocks = [card, paragraph, paragraph];
    let mut i = 0;
    while html.len() < target_bytes {
        html.push_str(blocks[i % blocks.len()]);
        i += 1;
    }
    html.push_str(player);
    html.push_str("\n</main></body></html>");
    html
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let resolver = StreamResolver::new();

    let players: &[(&str, &str)] = &[
        (
            "source_tag",
            r#"<video><source src="/media/42/master.m3u8" type="application/x-mpegURL"></video>"#,
        ),
        (
            "player_config",
            r#"<script>var playerConfig = {"sources":[{"src":"https://d1.cloudfront.net/42/720p.mp4","label":"720p"},{"src":"https://d1.cloudfront.net/42/360p.mp4","label":"360p"}]};</script>"#,
        ),
        ("fallback_only", r#"<div data-stream-file="https://cdn.example/hls/42/index"></div>"#),
        ("no_video", "<p>Film není dostupný.</p>"),
    ];

    for &(size, size_label) in &[(10_240usize, "10KB"), (102_400, "100KB")] {
        for &(name, player) in players {
            let html = generate_page(size, player);
            group.throughput(Throughput::Bytes(html.len() as u64));
            group.bench_with_input(BenchmarkId::new(name, size_label), &html, |b, html| {
                b.iter(|| black_box(resolver.resolve(black_box(html), Some(PLAYER_URL))));
            });
        }
    }

    group.finish();
}

fn bench_unwrap_envelope(c: &mut Criterion) {
    let snippet = generate_page(10_240, r#"<video><source src="/media/42/master.m3u8"></video>"#);
    let body = serde_json::json!({
        "snippets": {
            "#flash-messages": "<div></div>",
            "#film-player-container": snippet,
        }
    })
    .to_string();

    c.bench_function("unwrap_player_response_10kb", |b| {
        b.iter(|| black_box(unwrap_player_response(black_box(&body))));
    });
}

criterion_group!(benches, bench_resolve, bench_unwrap_envelope);
criterion_main!(benches);
