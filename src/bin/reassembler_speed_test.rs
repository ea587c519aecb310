use netstack::stream::{ByteStream, Reassembler};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::VecDeque;
use std::time::Instant;

fn speed_test(num_chunks: usize, capacity: usize, random_seed: u64) -> Result<(), String> {
    // Generate random data
    let mut rng = StdRng::seed_from_u64(random_seed);
    let mut data = vec![0u8; num_chunks * capacity];
    rng.fill_bytes(&mut data);

    // Split data up into overlapping segments
    let mut chunks: VecDeque<(u64, &[u8], bool)> = VecDeque::new();
    for i in (0..data.len()).step_by(capacity) {
        for offset in 0..3 {
            let start = i + offset;
            if start > data.len() {
                continue;
            }
            let end = usize::min(start + capacity * 2, data.len());
            let is_last = end >= data.len();
            chunks.push_back((start as u64, &data[start..end], is_last));
        }
    }

    // Set up Reassembler and output buffer
    let mut ra = Reassembler::new(ByteStream::new(capacity));
    let mut output_buffer = Vec::with_capacity(data.len());

    // Start timer
    let t0 = Instant::now();

    // Run simulation
    while let Some((first_index, segment, is_last)) = chunks.pop_front() {
        ra.insert(first_index, segment, is_last);

        let mut reader = ra.reader();
        let buffered = reader.bytes_buffered();
        output_buffer.extend_from_slice(&reader.peek()[..buffered]);
        reader.pop(buffered);
    }

    let duration = t0.elapsed();

    if !ra.output().is_finished() {
        return Err("Reassembler did not close ByteStream when finished".to_string());
    }

    if data != output_buffer {
        return Err("Mismatch between data inserted and data read".to_string());
    }

    // Calculate throughput
    let duration_secs = duration.as_secs_f64();
    let bytes_per_sec = (num_chunks * capacity) as f64 / duration_secs;
    let gigabits_per_sec = bytes_per_sec * 8.0 / 1e9;

    println!(
        "Reassembler to ByteStream with capacity={capacity} reached {gigabits_per_sec:.2} Gbit/s"
    );

    Ok(())
}

fn main() {
    let num_chunks = 10_000;
    let capacity = 1500;
    let random_seed = 1370;

    if let Err(e) = speed_test(num_chunks, capacity, random_seed) {
        eprintln!("Speed test failed: {e}");
        std::process::exit(1);
    }
}
