use criterion::{black_box, criterion_group, criterion_main, Criterion};
use paje::document::select_paragraphs;

fn benchmark_search(c: &mut Criterion) {
    let paragraph_counts = [100, 1_000, 10_000];
    let queries = [
        ("exact", "camomila estômago"),
        ("partial", "digerir"),
        ("leading", "xyzw"),
    ];

    for &count in &paragraph_counts {
        let document = (0..count)
            .map(|i| match i % 3 {
                0 => format!("Parágrafo {i}: a camomila é usada para dores de estômago."),
                1 => format!("Parágrafo {i}: o boldo ajuda na digestão depois das refeições."),
                _ => format!("Parágrafo {i}: a floresta guarda muitos saberes antigos."),
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        for (name, query) in queries {
            c.bench_function(&format!("{}_{}_paragraphs", name, count), |b| {
                b.iter(|| select_paragraphs(black_box(&document), black_box(query)))
            });
        }
    }
}

criterion_group!(benches, benchmark_search);
criterion_main!(benches);
