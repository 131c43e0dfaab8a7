use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::Throughput;
use criterion::{criterion_group, criterion_main};
use std::cell::RefCell;
use std::rc::Rc;
use time_common::{psi_tcp_fn, psi_unix_fn};

fn bench_psi(c: &mut Criterion) {
    let width = 632;
    let min_e = 8;
    let max_e = 16;

    let mut group = c.benchmark_group("psi_time");
    let base_port_rc: Rc<RefCell<usize>> = Rc::new(RefCell::new(20000));
    for e in (min_e..=max_e).step_by(2) {
        let size: usize = 1 << e;
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("UnixStream", size),
            &size,
            psi_unix_fn(width),
        );
        group.bench_with_input(
            BenchmarkId::new("TcpStream", size),
            &size,
            psi_tcp_fn(width, base_port_rc.clone()),
        );
    }
    group.finish();
}

fn bench_width(c: &mut Criterion) {
    let size = 1 << 12;

    let mut group = c.benchmark_group("psi_width_time");
    for width in [128, 256, 448, 632] {
        group.bench_with_input(
            BenchmarkId::new("UnixStream", width),
            &size,
            psi_unix_fn(width),
        );
    }
    group.finish();
}

criterion_group!(
    name = time_benches;
    config = Criterion::default().sample_size(10);
    targets = bench_psi, bench_width
);
criterion_main!(time_benches);

// cargo bench psi_time
// cargo bench psi_width_time
