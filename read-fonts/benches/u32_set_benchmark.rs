mod bench_helper;
use bench_helper::random_set;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use read_fonts::collections::U32Set;

struct SetTest {
    set_size: u32,
    density: u32,
}

impl SetTest {
    fn max_value(&self) -> u32 {
        self.density * self.set_size
    }
}

impl std::fmt::Display for SetTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.set_size, self.density)
    }
}

fn set_parameters() -> Vec<SetTest> {
    [2, 8, 64]
        .into_iter()
        .flat_map(|density| {
            [1024, 8192, 65_536]
                .into_iter()
                .map(move |set_size| SetTest { set_size, density })
        })
        .collect()
}

pub fn insert_benchmark(c: &mut Criterion) {
    for input in set_parameters() {
        c.bench_with_input(
            BenchmarkId::new("insert_1000", &input),
            &input,
            |b, p: &SetTest| {
                let set = random_set(p.set_size, p.max_value());
                b.iter_batched(
                    || set.clone(),
                    |mut s| {
                        for i in 0..1000u32 {
                            s.insert(i.wrapping_mul(2_654_435_761) % p.max_value());
                        }
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }
}

pub fn glyph_closure_benchmark(c: &mut Criterion) {
    // glyph ids collected while subsetting arrive as runs with gaps
    for input in set_parameters() {
        c.bench_with_input(
            BenchmarkId::new("insert_range", &input),
            &input,
            |b, p: &SetTest| {
                b.iter(|| {
                    let mut s = U32Set::empty();
                    let mut start = 0;
                    while start < p.max_value() {
                        s.insert_range(start..=start + p.density);
                        start += p.density * 3;
                    }
                    s
                })
            },
        );
    }
}

pub fn lookup_benchmark(c: &mut Criterion) {
    for input in set_parameters() {
        let set = random_set(input.set_size, input.max_value());
        let mut needle = input.max_value() / 2;
        c.bench_with_input(
            BenchmarkId::new("contains", &input),
            &set,
            |b, s: &U32Set| {
                b.iter(|| {
                    needle += 12345;
                    s.contains(needle % input.max_value())
                })
            },
        );
    }
}

pub fn iteration_benchmark(c: &mut Criterion) {
    for input in set_parameters() {
        let set = random_set(input.set_size, input.max_value());
        c.bench_with_input(BenchmarkId::new("iter", &input), &set, |b, s: &U32Set| {
            b.iter(|| {
                for v in s.iter() {
                    black_box(v);
                }
            })
        });
        c.bench_with_input(
            BenchmarkId::new("write_inverted", &input),
            &set,
            |b, s: &U32Set| {
                let mut out = [0u32; 256];
                b.iter(|| {
                    let mut next = 0;
                    while s.write_inverted(&mut next, &mut out) == out.len() {}
                })
            },
        );
    }
}

criterion_group!(
    benches,
    insert_benchmark,
    glyph_closure_benchmark,
    lookup_benchmark,
    iteration_benchmark,
);
criterion_main!(benches);
