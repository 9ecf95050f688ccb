//! # Encryption Demo
//!
//! Symmetric and asymmetric encryption of a short message.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encryption_demo
//! ```

use cryptomsg_core::crypto::{asymmetric, symmetric, KeyPair, SymmetricKey};
use cryptomsg_core::Error;

fn main() {
    println!("=== CryptoMsg Core: Encryption Demo ===\n");

    let message = "hello world";

    // Step 1: Symmetric (AES-256-CBC)
    println!("Step 1: AES-256-CBC with a random key...");

    let key = SymmetricKey::generate(256).expect("Failed to generate AES key");
    let envelope = symmetric::encrypt(message.as_bytes(), &key).expect("Encryption failed");

    println!("  Plaintext:  {:?} ({} bytes)", message, message.len());
    println!("  IV:         {}", hex::encode(&envelope.iv));
    println!(
        "  Ciphertext: {} ({} bytes, one padded block)",
        hex::encode(&envelope.ciphertext),
        envelope.ciphertext.len()
    );
    println!("  Combined:   {}", envelope.combined());

    let decrypted = symmetric::decrypt(&envelope, &key).expect("Decryption failed");
    println!("  Decrypted:  {:?}", String::from_utf8_lossy(&decrypted));
    println!();

    // Step 2: Same message, same key, different ciphertext
    println!("Step 2: Encrypting again with the same key...");
    let again = symmetric::encrypt(message.as_bytes(), &key).expect("Encryption failed");
    println!("  Ciphertext: {}", hex::encode(&again.ciphertext));
    println!(
        "  Different from step 1: {}",
        again.ciphertext != envelope.ciphertext
    );
    println!();

    // Step 3: Asymmetric (RSA-2048-OAEP)
    println!("Step 3: RSA-2048 with OAEP-SHA256...");
    let bob = KeyPair::generate(2048).expect("Failed to generate key pair");
    let max = asymmetric::max_plaintext_len(bob.public.size_bytes());
    println!("  Max plaintext for 2048-bit key: {} bytes", max);

    let rsa_envelope =
        asymmetric::encrypt(message.as_bytes(), &bob.public).expect("Encryption failed");
    println!(
        "  Ciphertext: {}... ({} bytes)",
        hex::encode(&rsa_envelope.ciphertext[..16]),
        rsa_envelope.ciphertext.len()
    );

    let decrypted = asymmetric::decrypt(&rsa_envelope, &bob.private).expect("Decryption failed");
    println!("  Decrypted:  {:?}", String::from_utf8_lossy(&decrypted));
    println!();

    // Step 4: Size bound
    println!("Step 4: Encrypting {} bytes (one over the limit)...", max + 1);
    match asymmetric::encrypt(&vec![b'x'; max + 1], &bob.public) {
        Err(Error::PlaintextTooLarge { size, max, .. }) => {
            println!("  Rejected: {} bytes > {} bytes", size, max)
        }
        other => println!("  Unexpected result: {:?}", other.map(|_| ())),
    }
    println!();

    // Step 5: Wrong key
    println!("Step 5: Decrypting with the wrong key...");
    let eve = KeyPair::generate(2048).expect("Failed to generate key pair");
    match asymmetric::decrypt(&rsa_envelope, &eve.private) {
        Err(e) => println!("  Error: {} (code {})", e, e.code()),
        Ok(_) => println!("  Unexpectedly decrypted!"),
    }

    println!("\n=== Demo Complete ===");
}
