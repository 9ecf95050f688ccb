//! # Trace Demo
//!
//! Prints every intermediate step of symmetric encryption, asymmetric
//! encryption and signing.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example trace_demo
//! ```

use cryptomsg_core::{CryptoService, TraceStep};

fn print_steps(steps: &[TraceStep]) {
    for step in steps {
        println!("  {:>2}. {}", step.step, step.name);
        println!("      {}", step.data);
        for (key, value) in &step.details {
            println!("      {}: {}", key, value);
        }
    }
}

fn main() {
    println!("=== CryptoMsg Core: Step Trace Demo ===\n");

    let service = CryptoService::default();
    let message = "hello world";

    println!("AES-256-CBC:");
    let key = service.generate_symmetric_key(None).expect("Failed to generate key");
    let traced = service
        .encrypt_symmetric_traced(message, &key)
        .expect("Encryption failed");
    print_steps(&traced.steps);
    println!();

    let pair = service.generate_key_pair(None).expect("Failed to generate key pair");

    println!("RSA-OAEP:");
    let traced = service
        .encrypt_asymmetric_traced(message, &pair.public_key)
        .expect("Encryption failed");
    print_steps(&traced.steps);
    println!();

    println!("RSA-PSS:");
    let traced = service
        .sign_traced(message, &pair.private_key)
        .expect("Signing failed");
    print_steps(&traced.steps);

    println!("\n=== Demo Complete ===");
}
