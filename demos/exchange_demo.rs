//! # Message Exchange Demo
//!
//! Two users register each other as parties and exchange sealed messages:
//! 1. Create a core for Alice and one for Bob
//! 2. Swap public key text and register each other
//! 3. Seal a message, open it, and attribute it to its sender
//! 4. Show what happens with tampered or misaddressed ciphertext
//!
//! ## Run
//!
//! ```bash
//! RUST_LOG=courier_core=debug cargo run --example exchange_demo
//! ```

use courier_core::{CoreConfig, CourierCore, EphemeralIdentitySource, ErrorReport};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "courier_core=info".into()),
        )
        .init();

    println!("=================================================");
    println!("          COURIER MESSAGE EXCHANGE DEMO");
    println!("=================================================\n");

    // =========================================================================
    // STEP 1: Create identities
    // =========================================================================
    println!("1. Creating identities...\n");

    let alice = CourierCore::new(CoreConfig::default(), &EphemeralIdentitySource)
        .expect("Failed to create Alice's core");
    let bob = CourierCore::new(CoreConfig::default(), &EphemeralIdentitySource)
        .expect("Failed to create Bob's core");

    println!("   Alice's key: {}", alice.local_public_key());
    println!("   Alice's fingerprint: {}", alice.identity().fingerprint());
    println!("   Bob's key:   {}", bob.local_public_key());
    println!("   Bob's fingerprint:   {}", bob.identity().fingerprint());
    println!();

    // =========================================================================
    // STEP 2: Register each other
    // =========================================================================
    println!("2. Registering parties...\n");

    let bob_entry = alice
        .registry()
        .add("Bob", &bob.local_public_key())
        .expect("Failed to register Bob");
    bob.registry()
        .add("Alice", &alice.local_public_key())
        .expect("Failed to register Alice");

    println!("   Alice sees Bob with fingerprint {}", bob_entry.fingerprint());

    let duplicate = alice.registry().add("Bob", &bob.local_public_key());
    if let Err(e) = duplicate {
        print_error("Registering Bob twice", e);
    }
    println!();

    // =========================================================================
    // STEP 3: Exchange a message
    // =========================================================================
    println!("3. Exchanging a message...\n");

    let sealed = alice
        .encrypt_message("Bob", "The package arrives Tuesday.")
        .expect("Failed to encrypt");
    println!("   Ciphertext ({} chars): {}...", sealed.len(), &sealed[..48]);

    let received = bob.open_message(&sealed).expect("Failed to decrypt");
    println!(
        "   Bob read \"{}\" from {}",
        received.text,
        received.sender.as_deref().unwrap_or("an unknown sender")
    );
    println!();

    // =========================================================================
    // STEP 4: Failure cases
    // =========================================================================
    println!("4. Failure cases...\n");

    let mut tampered: Vec<char> = sealed.chars().collect();
    let middle = tampered.len() / 2;
    tampered[middle] = if tampered[middle] == 'A' { 'B' } else { 'A' };
    let tampered: String = tampered.into_iter().collect();
    if let Err(e) = bob.decrypt_message(&tampered) {
        print_error("Tampered ciphertext", e);
    }

    if let Err(e) = alice.decrypt_message(&sealed) {
        print_error("Alice opening Bob's message", e);
    }

    if let Err(e) = alice.registry().add("Carol", "not-a-key") {
        print_error("Registering a malformed key", e);
    }

    println!();
    println!("=================================================");
    println!("                    DONE");
    println!("=================================================");
}

fn print_error(context: &str, err: courier_core::Error) {
    let report = ErrorReport::from(err);
    println!(
        "   {}: [{}] {} (field: {:?})",
        context, report.code, report.message, report.field
    );
}
