#[macro_use]
extern crate criterion;

use liberty_tojson::parse_multi;

use criterion::Criterion;

macro_rules! my_bench_file {
    ($fname:ident) => {
        fn $fname(c: &mut Criterion) {
            let data = include_str!(concat!("../data/", stringify!($fname), ".lib"));
            c.bench_function(stringify!($fname), move |b| {
                b.iter(|| parse_multi(data).unwrap())
            });
        }
    };
}

my_bench_file!(small);
my_bench_file!(cells);

criterion_group!(benches, small, cells);
criterion_main!(benches);
