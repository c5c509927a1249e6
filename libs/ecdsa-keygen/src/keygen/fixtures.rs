//! Fixed parameters that keep tests fast.

#![allow(clippy::indexing_slicing, clippy::expect_used, clippy::arithmetic_side_effects)]

use crate::{config::KeygenConfig, keygen::pre_params::LocalPreParams};
use libpaillier::unknown_order::BigNumber;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;

// 512 bit safe primes. Generating these on every test run would take far too long.
const SAFE_PRIMES: [&str; 16] = [
    "92ef54f41a7ffb61d0c63b0c7375ffa2f3881260a738e724bf4ebb034f2c1d9d59909255bdcbe5b39b14cca900b14b9b60fe987c69d58116a2f25186d4cde1cf",
    "d9ea17a66e07b0749aab74e4f7eeed4fd7621990429e26c359d8bcbe138eced8e6af099a41ff6beb833dc7363a8b8c004880064808b973b951d8c7b6b99fb0db",
    "f15d68208559708d783c99c32ff00e4fa1a80c33f2e49c7a1aa903e2649b284cb5f73cb524dbd0d7e07a1111b64d1f95e46631b01935a6140b051f3628cbd8d3",
    "ba1e6262bae573cd38bdc582c6707ae58a87c7e54a5109b4a691d63ab1caac703633edf0b0b73844a7dba93faef6df4b491fd650f5f2bef8a26b1f2dd423714f",
    "8fe80b490de2d390a0c1285d204de4c616be00a4d1c69fb9eddbfeff68782d6bd5d898affa73caecdc6e2747a415650f186ab4e2d3b606d0bc71211d751a557b",
    "9c732b37ff8f2126e445efb0edf44fca1a0782440cf5726dbbb19fee29fee14af36f6171be948105df5015c83c01103085db201783b2377a46c6f9cb6ba98d9f",
    "85d029c4f404bd2d2b452d1027066e02be5cc8eced1d5c8eaafd84fbfd20e9b969d4814de93aed663aaeedc8f38e5cca24f177c4c1f6c39a84f2d39033788fe7",
    "8e20c3492837f34f6bea8407e46cd2dcb05c770154bd7eb149bc6d1b9ca73fb509a1690b03538bfbdad962dd9b4713f07a4914211999307dc1507d51ada3ebbf",
    "92c034f0ddc2f39ff049cc2bf8f585370d12473dca6490e7841838c2cc460425b4c12afb25dd11ff10ea30856b2a2aade5c30f11ba7787df76be0e09c3e01b0b",
    "f6b04388885d2a733c8f466e8775f1c10721bccfdf29dc987c9dcffc4101a25c11fac7949864348f4292531c99973d659d4611202c67d8a4bcef3060fb3d23d7",
    "e514f0013ac58b1667fb9a7214df374f78deb50fe06f84ed79b7959b254aba066442ba936ee67ed2e5a4385d0a91b9e865fe2bb997a4286ce685dbf6070faad3",
    "ad8e01b94af2c63389d5bedaf37f93593f35e1f740543f46de2e1da76b3e484f17d470daf2e65c26ada4f81c7808593dfa55a781e1161767fe53f3da0136e363",
    "ed7cb02b8cb2ba85b38725f2c54200a04534149248a724fba2bf8e958527ef794f21218b7034c9f952896b76ffae90d70fc279be19e84aea6459e21716dd6c6b",
    "8c0b524081ab986f7ce9d3204f5a9d6ae7dd0648f38d905bc6790e47df453323d791bf82afb9ec7e1876e1b1ed713508952c1aad235d3b04dcee1048657964d7",
    "f47283cff5187ef6e186f50dbf61716a9163747f070b0621102e20a034faa8b44df50705a05a5e4ddb1edcaa99cbdd2c82592ef4247cb92c3f38f48ce974ab2f",
    "fbae52f2a18bb9aa3ededf5a7c75f4dddcef468fa8883ebd6322a5d24303555840d4ba5295923277a8e9127908478d744e1ac506c74916d5e3495d08bb157733",
];

static PRE_PARAMS: Lazy<Vec<LocalPreParams>> = Lazy::new(|| {
    (0..SAFE_PRIMES.len() / 4)
        .map(|party| {
            let primes: Vec<_> = (party * 4..party * 4 + 4).map(safe_prime).collect();
            LocalPreParams::from_safe_primes(&primes[0], &primes[1], &primes[2], &primes[3], &mut OsRng)
                .expect("invalid fixture primes")
        })
        .collect()
});

/// The number of parties we have pre-parameters for.
pub(crate) const MAX_PARTIES: usize = SAFE_PRIMES.len() / 4;

/// Get the i-th fixed safe prime.
pub(crate) fn safe_prime(index: usize) -> BigNumber {
    let bytes = hex::decode(SAFE_PRIMES[index]).expect("invalid hex");
    BigNumber::from_slice(bytes)
}

/// Get the pre-parameters for the given party.
pub(crate) fn pre_params(party: usize) -> LocalPreParams {
    PRE_PARAMS[party].clone()
}

/// A configuration matching the size of the fixed primes.
pub(crate) fn test_config() -> KeygenConfig {
    KeygenConfig { paillier_modulus_bits: 1024, ntilde_modulus_bits: 1024, min_modulus_bits: 1023 }
}

#[test]
fn safe_primes_are_valid() {
    use crate::crypto::math::sophie_germain_prime;

    assert_eq!(SAFE_PRIMES.len() % 4, 0);
    assert_eq!(MAX_PARTIES, 4);
    for index in 0..SAFE_PRIMES.len() {
        let prime = safe_prime(index);
        assert_eq!(prime.bit_length(), 512);
        assert!(prime.is_prime());
        assert!(sophie_germain_prime(&prime).is_prime());
    }
    assert_eq!(PRE_PARAMS.len(), MAX_PARTIES);
}
