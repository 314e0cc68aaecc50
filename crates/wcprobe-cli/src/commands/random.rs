//! Random command - prints filler values.

use wcprobe_random::PayloadGenerator;

pub fn run(seed: Option<u64>, prime: Option<u64>, count: usize, length: Option<usize>) {
    let mut generator = match seed {
        Some(seed) => PayloadGenerator::seeded(seed, prime),
        None => PayloadGenerator::new(),
    };

    for _ in 0..count {
        let name = generator.random_string(length, None);
        let value = generator.random_int(None);
        println!("{name}\t{value}");
    }
}
