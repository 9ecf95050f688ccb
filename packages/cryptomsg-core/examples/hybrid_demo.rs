//! # Hybrid Demo
//!
//! Alice sends Bob a long signed message: an AES body plus the AES key
//! wrapped with Bob's RSA key.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example hybrid_demo
//! ```

use cryptomsg_core::{CryptoService, Mode, ProtectKeys, RecoverKeys};

fn main() {
    println!("=== CryptoMsg Core: Hybrid Encryption Demo ===\n");

    let service = CryptoService::default();

    // Step 1: Key pairs
    println!("Step 1: Generating key pairs for Alice and Bob...");
    let alice = service.generate_key_pair(None).expect("Failed to generate key pair");
    let bob = service.generate_key_pair(None).expect("Failed to generate key pair");
    println!("  Both key pairs: {} bits", alice.key_size);
    println!();

    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                     HYBRID MESSAGE                          │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   message ──► AES-256-CBC(K) ──────────► ciphertext, iv     │");
    println!("  │   K ────────► RSA-OAEP(Bob's public) ──► encrypted_key      │");
    println!("  │   message ──► RSA-PSS(Alice's private) ► signature          │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    // Step 2: Protect
    let message = "Meet me at the usual place. ".repeat(20);
    println!(
        "Step 2: Alice protects a {}-byte message (too long for RSA alone)...",
        message.len()
    );
    let protected = service
        .protect(
            &message,
            Mode::Hybrid,
            &ProtectKeys {
                recipient_public: Some(&bob.public_key),
                sender_private: Some(&alice.private_key),
                symmetric_key: None,
            },
        )
        .expect("Protect failed");

    let json = protected.sealed.to_json().expect("Serialization failed");
    println!("  Sealed message: {} bytes of JSON", json.len());
    println!(
        "  Encrypted key:  {}...",
        &protected.sealed.encrypted_key.as_deref().unwrap_or_default()[..32]
    );
    println!();

    // Step 3: Recover
    println!("Step 3: Bob recovers it...");
    let recovered = service
        .recover(
            &protected.sealed,
            &RecoverKeys {
                own_private: Some(&bob.private_key),
                counterparty_public: Some(&alice.public_key),
                symmetric_key: None,
            },
        )
        .expect("Recover failed");
    println!("  Text matches:    {}", recovered.text == message);
    println!("  Signature valid: {:?}", recovered.signature_valid);
    println!();

    // Step 4: Someone else tries
    println!("Step 4: Alice tries to open Bob's message...");
    match service.recover(
        &protected.sealed,
        &RecoverKeys {
            own_private: Some(&alice.private_key),
            ..Default::default()
        },
    ) {
        Err(e) => println!("  Error: {}", e),
        Ok(_) => println!("  Unexpectedly recovered!"),
    }

    println!("\n=== Demo Complete ===");
}
