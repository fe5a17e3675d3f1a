use std::{cell::RefCell, sync::Arc};

use criterion::{criterion_group, criterion_main, Criterion};
use rand::{RngCore, SeedableRng};

use tristate_sim::{
    builder::CircuitBuilder, components::adder::RippleCarryAdder, subcircuit::create_subcircuit,
    PinState,
};

pub fn adder_bench<const BITS: usize>(c: &mut Criterion) {
    if BITS > 32 {
        panic!("Too large an adder!")
    };
    let name = format!("{BITS}-bit adder");
    let builder = Arc::new(RefCell::new(CircuitBuilder::default()));
    let rca = RippleCarryAdder::<BITS>::new(builder.clone());
    let mut borrow = builder.borrow_mut();
    let (circuit, _) = borrow.build();
    c.bench_function(&name, |b| {
        let mut rng = rand::rngs::StdRng::from_entropy();
        b.iter_batched(
            move || rng.next_u64(),
            |input| {
                rca.input_a.set(circuit, input & 0xffff_ffff);
                rca.input_b.set(circuit, input >> 32)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn adder_benches(c: &mut Criterion) {
    adder_bench::<8>(c);
    adder_bench::<16>(c);
    adder_bench::<32>(c);
}

fn packed_adder_bench(c: &mut Criterion) {
    const BITS: usize = 16;
    let builder = Arc::new(RefCell::new(CircuitBuilder::default()));
    RippleCarryAdder::<BITS>::new(builder.clone());
    let mut borrow = builder.borrow_mut();
    let parts = &mut *borrow;
    let all: Vec<_> = parts.circuit.components().map(|(id, _)| id).collect();
    let block = create_subcircuit(&mut parts.circuit, &mut parts.pins, &all, "ADD16")
        .and_then(|id| parts.circuit.component(id).cloned())
        .expect("adder packs into a block");
    println!("inputs: {}, outputs: {}", block.inputs().len(), block.outputs().len());

    c.bench_function("16-bit packed adder", |b| {
        let mut rng = rand::rngs::StdRng::from_entropy();
        let mut block = block.clone();
        b.iter_batched(
            move || rng.next_u64(),
            |input| {
                let inputs: Vec<_> = (0..2 * BITS + 1)
                    .map(|bit| PinState::from_bool(input & (1 << bit) != 0))
                    .collect();
                block.update(&inputs)
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = adder_benches, packed_adder_bench
}
criterion_main!(benches);
