use chip::{
    chip8::ChipSet,
    devices::Keyboard,
    opcode::disassemble,
    timer::ManualWorker,
};
use criterion::{criterion_group, criterion_main, Criterion};

/// Counts `V0` up and draws the matching glyph, forever.
static BASE_PROGRAM: once_cell::sync::Lazy<Vec<u8>> = once_cell::sync::Lazy::new(|| {
    [
        0x00E0u16, // CLS
        0x7001,    // ADD V0, 0x01
        0xF029,    // LD F, V0
        0xD125,    // DRW V1, V2, 5
        0x8014,    // ADD V0, V1
        0x1200,    // JP 0x200
    ]
    .iter()
    .flat_map(|opcode| opcode.to_be_bytes())
    .collect()
});

/// will setup the default configured chip
fn get_default_chip() -> ChipSet<ManualWorker> {
    ChipSet::new(&BASE_PROGRAM, Keyboard::new()).expect("The program fits into memory.")
}

pub fn execute_bench(c: &mut Criterion) {
    let mut chip = get_default_chip();
    c.bench_function("execute_bench", |b| {
        b.iter(|| {
            for _ in 0..BASE_PROGRAM.len() / 2 {
                let _ = chip.next();
            }
        });
    });
}

pub fn print_bench(c: &mut Criterion) {
    let chip = get_default_chip();
    c.bench_function("print_bench", |b| {
        b.iter(|| {
            let _ = format!("{}", chip);
        });
    });
}

pub fn disassemble_bench(c: &mut Criterion) {
    c.bench_function("disassemble_bench", |b| {
        b.iter(|| disassemble(&BASE_PROGRAM, 0x200));
    });
}

criterion_group!(benches, execute_bench, print_bench, disassemble_bench);
criterion_main!(benches);
