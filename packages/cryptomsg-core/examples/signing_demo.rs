//! # Signing Demo
//!
//! RSA-PSS signatures through the text-level service.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example signing_demo
//! ```

use cryptomsg_core::CryptoService;

fn main() {
    println!("=== CryptoMsg Core: Signing Demo ===\n");

    let service = CryptoService::default();

    // Step 1: Key pair
    println!("Step 1: Generating a 2048-bit key pair...");
    let alice = service
        .generate_key_pair(None)
        .expect("Failed to generate key pair");
    println!(
        "  Public key: {}",
        alice.public_key.lines().next().unwrap_or_default()
    );
    println!();

    // Step 2: Sign
    let message = "I, Alice, agree to the terms.";
    println!("Step 2: Signing {:?}...", message);
    let signature = service
        .sign(message, &alice.private_key)
        .expect("Signing failed");
    println!("  Signature: {}...", &signature[..32]);
    println!();

    // Step 3: Verify
    println!("Step 3: Verifying...");
    let report = service
        .verify(message, &signature, &alice.public_key)
        .expect("Verification errored");
    println!("  {} (valid: {})", report.message, report.valid);
    println!();

    // Step 4: Probabilistic signatures
    println!("Step 4: Signing the same message again...");
    let second = service
        .sign(message, &alice.private_key)
        .expect("Signing failed");
    println!("  Same signature: {}", second == signature);
    let report = service
        .verify(message, &second, &alice.public_key)
        .expect("Verification errored");
    println!("  Second signature: {}", report.message);
    println!();

    // Step 5: Tampering
    let tampered = "I, Alice, agree to the terms!";
    println!("Step 5: Verifying a tampered message {:?}...", tampered);
    let report = service
        .verify(tampered, &signature, &alice.public_key)
        .expect("Verification errored");
    println!("  {} (valid: {})", report.message, report.valid);

    println!("\n=== Demo Complete ===");
}
