//! Falcon signature library integration tests

use std::io::Write;
use std::sync::Arc;

use falcon_signer::config::load_config;
use falcon_signer::{
    api, ExpandedKey, FalconConfig, FalconError, FalconSigner, KeyGenerator, ParameterSet,
    PrivateKey, PublicKey, RandomSource, SeededRandom, SignatureScheme, Signer, Verifier,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("falcon_signer=debug")
        .try_init();
}

fn seeded(seed: u64) -> Arc<dyn RandomSource> {
    Arc::new(SeededRandom::from_u64(seed))
}

#[test]
fn test_full_sign_verify_workflow() {
    init_tracing();

    // 1. Generate keypair
    let random = seeded(100);
    let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone())
        .generate()
        .unwrap();
    let pk = keys.public_key().to_bytes();
    assert_eq!(pk.len(), 897);
    assert_eq!(pk[0], 0x09);
    let sk = keys.private_key().to_bytes();
    assert_eq!(sk.len(), 1281);
    assert_eq!(sk[0], 0x59);

    // 2. Sign
    let mut buf = [0u8; 666];
    let len = api::sign(&sk, b"Hello, world!", &mut buf, random.as_ref()).unwrap();
    let signature = &buf[..len];
    assert!(len > 41 && len <= 666);
    assert_eq!(signature[0], 0x39);
    println!("✓ Generated signature: {} bytes", len);

    // 3. Verify
    assert!(api::verify(&pk, b"Hello, world!", signature));
    println!("✓ Signature verified successfully");

    // 4. Tamper detection
    assert!(!api::verify(&pk, b"Hello, world?", signature));
    println!("✓ Tamper detection works");
}

#[test]
fn test_signature_mutations_are_rejected() {
    let random = seeded(101);
    let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone())
        .generate()
        .unwrap();
    let message = b"mutation target";
    let signature = Signer::new(random)
        .sign(keys.private_key(), message)
        .unwrap()
        .into_bytes();
    assert!(Verifier::verify(keys.public_key(), message, &signature));

    // flip one bit in the header, the nonce and the payload
    for &index in &[0, 1, 20, 40, 41, 100, signature.len() / 2, signature.len() - 1] {
        for bit in [0u8, 3, 7] {
            let mut mutated = signature.clone();
            mutated[index] ^= 1 << bit;
            assert!(
                !Verifier::verify(keys.public_key(), message, &mutated),
                "bit {bit} of byte {index} flipped but signature still verified"
            );
        }
    }

    // truncated, extended, empty
    assert!(!Verifier::verify(keys.public_key(), message, &signature[..signature.len() - 1]));
    let mut extended = signature.clone();
    extended.push(0);
    assert!(!Verifier::verify(keys.public_key(), message, &extended));
    assert!(!Verifier::verify(keys.public_key(), message, &[]));
}

#[test]
fn test_wrong_key_is_rejected() {
    let random = seeded(102);
    let generator = KeyGenerator::new(ParameterSet::Falcon512, random.clone());
    let alice = generator.generate().unwrap();
    let bob = generator.generate().unwrap();
    assert_ne!(alice.public_key(), bob.public_key());

    let signature = Signer::new(random)
        .sign(alice.private_key(), b"from alice")
        .unwrap();
    assert!(Verifier::verify(alice.public_key(), b"from alice", signature.as_bytes()));
    assert!(!Verifier::verify(bob.public_key(), b"from alice", signature.as_bytes()));
}

#[test]
fn test_generated_keys_are_distinct() {
    let generator = KeyGenerator::new(ParameterSet::Falcon512, seeded(112));
    let mut secret_keys = Vec::new();
    for _ in 0..16 {
        let keys = generator.generate().unwrap();
        secret_keys.push(keys.private_key().to_bytes());
    }

    for (i, a) in secret_keys.iter().enumerate() {
        for b in &secret_keys[i + 1..] {
            assert_ne!(a, b, "two generations produced the same private key");
        }
    }
    println!("✓ {} private keys, all distinct", secret_keys.len());
}

#[test]
fn test_keypair_persistence() {
    // 1. Generate the original keypair
    let mut original = FalconSigner::with_random_source(FalconConfig::default(), seeded(103)).unwrap();
    original.generate_keypair().unwrap();

    // 2. Export keys
    let public_key = original.public_key().to_vec();
    let secret_key = original.secret_key().unwrap();
    println!("✓ Exported keys: pk={} bytes, sk={} bytes", public_key.len(), secret_key.len());

    // 3. Decoding and re-encoding reproduces the exact bytes
    let decoded_pk = PublicKey::from_bytes(&public_key).unwrap();
    assert_eq!(decoded_pk.to_bytes(), public_key);
    let decoded_sk = PrivateKey::from_bytes(&secret_key).unwrap();
    assert_eq!(*decoded_sk.to_bytes(), *secret_key);
    assert_eq!(decoded_sk.public_key().unwrap(), decoded_pk);

    // 4. The restored keypair signs and the original verifies
    let restored = FalconSigner::from_bytes(&public_key, &secret_key).unwrap();
    let message = b"Test message after key restoration";
    let signature = restored.sign(message).unwrap();
    assert!(original.verify(message, &signature).unwrap());
    println!("✓ Restored keypair works correctly");
}

#[test]
fn test_signatures_use_fresh_nonces() {
    let random = seeded(104);
    let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone())
        .generate()
        .unwrap();
    let expanded = ExpandedKey::new(keys.private_key()).unwrap();
    let signer = Signer::new(random);

    let signatures: Vec<_> = (0..8)
        .map(|_| signer.sign_expanded(&expanded, b"repeated").unwrap())
        .collect();
    for (i, a) in signatures.iter().enumerate() {
        assert!(keys.public_key().verify(b"repeated", a.as_bytes()));
        for b in &signatures[i + 1..] {
            assert_ne!(a.nonce(), b.nonce());
            assert_ne!(a.as_bytes(), b.as_bytes());
        }
    }
}

#[test]
fn test_seeded_runs_are_deterministic() {
    let run = |seed: u64| {
        let random = seeded(seed);
        let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone())
            .generate()
            .unwrap();
        let signature = Signer::new(random)
            .sign(keys.private_key(), b"deterministic")
            .unwrap();
        (keys.public_key().to_bytes(), signature.into_bytes())
    };

    let (pk_a, sig_a) = run(105);
    let (pk_b, sig_b) = run(105);
    assert_eq!(pk_a, pk_b);
    assert_eq!(sig_a, sig_b);

    let (pk_c, _) = run(106);
    assert_ne!(pk_a, pk_c);
}

#[test]
fn test_multiple_messages() {
    let random = seeded(107);
    let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone())
        .generate()
        .unwrap();
    let expanded = ExpandedKey::new(keys.private_key()).unwrap();
    let signer = Signer::new(random);

    let long_message = "Very long message ".repeat(1000);
    let messages: [&[u8]; 4] = [b"", b"a", b"Short message", long_message.as_bytes()];

    for message in messages {
        let signature = signer.sign_expanded(&expanded, message).unwrap();
        assert!(
            Verifier::verify(keys.public_key(), message, signature.as_bytes()),
            "Failed to verify message of {} bytes",
            message.len()
        );
    }
}

#[test]
fn test_small_buffer_is_rejected() {
    let random = seeded(108);
    let (_, sk) = api::generate_keypair(ParameterSet::Falcon512, random.as_ref()).unwrap();

    let mut buf = [0u8; 665];
    let err = api::sign(&sk, b"msg", &mut buf, random.as_ref()).unwrap_err();
    assert!(matches!(
        err,
        FalconError::BufferTooSmall {
            required: 666,
            actual: 665
        }
    ));
    assert!(buf.iter().all(|&b| b == 0));

    // larger buffers are fine; only the returned length is meaningful
    let mut big = [0u8; 2048];
    let len = api::sign(&sk, b"msg", &mut big, random.as_ref()).unwrap();
    assert!(len <= 666);
}

#[test]
fn test_malformed_keys_are_rejected() {
    assert!(matches!(
        PublicKey::from_bytes(&[0x09; 100]),
        Err(FalconError::MalformedKey(_))
    ));
    assert!(matches!(
        PrivateKey::from_bytes(&[0x09; 1281]),
        Err(FalconError::MalformedKey(_))
    ));
    assert!(!api::verify(&[0u8; 897], b"msg", &[0x39; 600]));
    assert!(FalconSigner::from_public_key_only(&[]).is_err());
}

#[test]
fn test_falcon1024_workflow() {
    let config = FalconConfig {
        parameter_set: ParameterSet::Falcon1024,
        ..FalconConfig::default()
    };
    let mut signer = FalconSigner::with_random_source(config, seeded(109)).unwrap();
    signer.generate_keypair().unwrap();
    assert_eq!(signer.algorithm_name(), "Falcon-1024");
    assert_eq!(signer.public_key().len(), 1793);
    assert_eq!(signer.public_key()[0], 0x0A);
    assert_eq!(signer.secret_key().unwrap().len(), 2305);

    let signature = signer.sign(b"level five").unwrap();
    assert!(signature.len() <= 1280);
    assert_eq!(signature[0], 0x3A);
    assert!(signer.verify(b"level five", &signature).unwrap());
    assert!(!signer.verify(b"level four", &signature).unwrap());

    // a Falcon-1024 signature never verifies under a Falcon-512 key
    let other = KeyGenerator::new(ParameterSet::Falcon512, seeded(110))
        .generate()
        .unwrap();
    assert!(!Verifier::verify(other.public_key(), b"level five", &signature));
}

#[test]
fn test_concurrent_signing_with_shared_source() {
    let random = seeded(111);
    let keys = KeyGenerator::new(ParameterSet::Falcon512, random.clone())
        .generate()
        .unwrap();
    let expanded = Arc::new(ExpandedKey::new(keys.private_key()).unwrap());
    let signer = Signer::new(random);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let signer = signer.clone();
            let expanded = Arc::clone(&expanded);
            std::thread::spawn(move || {
                let message = format!("thread {i}");
                let signature = signer.sign_expanded(&expanded, message.as_bytes()).unwrap();
                (message, signature)
            })
        })
        .collect();

    for handle in handles {
        let (message, signature) = handle.join().unwrap();
        assert!(Verifier::verify(keys.public_key(), message.as_bytes(), signature.as_bytes()));
    }
}

#[test]
fn test_load_config_from_toml() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
parameter_set = "falcon-1024"
sign_max_attempts = 128
"#
    )
    .unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.parameter_set, ParameterSet::Falcon1024);
    assert_eq!(config.sign_max_attempts, 128);
    assert_eq!(config.keygen_max_attempts, FalconConfig::default().keygen_max_attempts);
}

#[test]
fn test_load_config_rejects_zero_attempts() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "keygen_max_attempts = 0").unwrap();
    assert!(matches!(load_config(file.path()), Err(FalconError::Config(_))));
}
