use passhash::django::SALT_CHARS;
use passhash::{
    Advisory, DjangoDisabled, DjangoPbkdf2Sha1, DjangoPbkdf2Sha256, DjangoSaltedMd5,
    DjangoSaltedSha1, Error, Field, Handler, HasUserContext, LdapMd5, LdapPlaintext,
    LdapSaltedMd5, LdapSaltedSha1, LdapSha1, LmHash, Msdcc, Msdcc2, NtHash, Scram, Settings,
};
use proptest::prelude::*;
use rstest::rstest;

/// Names of every scheme that claims `hash`. Plaintext claims nearly anything and is left out.
fn identify_all(hash: &str) -> Vec<&'static str> {
    let claims = [
        (Scram::identify(hash), Scram::name()),
        (DjangoPbkdf2Sha256::identify(hash), DjangoPbkdf2Sha256::name()),
        (DjangoPbkdf2Sha1::identify(hash), DjangoPbkdf2Sha1::name()),
        (DjangoSaltedSha1::identify(hash), DjangoSaltedSha1::name()),
        (DjangoSaltedMd5::identify(hash), DjangoSaltedMd5::name()),
        (DjangoDisabled::identify(hash), DjangoDisabled::name()),
        (LdapMd5::identify(hash), LdapMd5::name()),
        (LdapSha1::identify(hash), LdapSha1::name()),
        (LdapSaltedMd5::identify(hash), LdapSaltedMd5::name()),
        (LdapSaltedSha1::identify(hash), LdapSaltedSha1::name()),
        (LmHash::identify(hash), LmHash::name()),
        (NtHash::identify(hash), NtHash::name()),
        (Msdcc::identify(hash), Msdcc::name()),
        (Msdcc2::identify(hash), Msdcc2::name()),
    ];
    claims
        .iter()
        .filter(|(claimed, _)| *claimed)
        .map(|&(_, name)| name)
        .collect()
}

fn round_trip<H: Handler>(secret: &[u8], settings: &Settings<'_>) {
    let hash = H::encrypt(secret, settings).unwrap().into_inner();
    assert_eq!(H::from_string(&hash).unwrap().to_string(), hash);
    assert!(H::identify(&hash));
    assert!(H::verify(secret, &hash).unwrap());
    assert!(H::verify(secret, &hash).unwrap());
    let mut other = secret.to_vec();
    other.push(b'!');
    assert!(!H::verify(&other, &hash).unwrap());
}

fn round_trip_for<H: HasUserContext>(secret: &[u8], user: &str) {
    let hash = H::encrypt(secret, &Settings::new().user(user))
        .unwrap()
        .into_inner();
    assert_eq!(H::from_string(&hash).unwrap().to_string(), hash);
    assert!(H::verify_for(secret, &hash, &user.to_uppercase()).unwrap());
    assert!(!H::verify_for(secret, &hash, "someone else").unwrap());
    assert_eq!(H::genhash_for(secret, &hash, user).unwrap().into_inner(), hash);
    assert_eq!(
        H::verify(secret, &hash),
        Err(Error::MissingParameter {
            scheme: H::name(),
            field: Field::User
        })
    );
}

#[test]
fn every_scheme_round_trips() {
    let secret = b"correct horse battery staple";
    let cheap = Settings::new().rounds(10);
    round_trip::<Scram>(secret, &cheap);
    round_trip::<DjangoPbkdf2Sha256>(secret, &cheap);
    round_trip::<DjangoPbkdf2Sha1>(secret, &cheap);
    round_trip::<DjangoSaltedSha1>(secret, &Settings::new());
    round_trip::<DjangoSaltedMd5>(secret, &Settings::new());
    round_trip::<LdapMd5>(secret, &Settings::new());
    round_trip::<LdapSha1>(secret, &Settings::new());
    round_trip::<LdapSaltedMd5>(secret, &Settings::new());
    round_trip::<LdapSaltedSha1>(secret, &Settings::new());
    round_trip::<LdapPlaintext>(secret, &Settings::new());
    round_trip::<NtHash>(secret, &Settings::new());
    round_trip::<NtHash>(secret, &Settings::new().ident("bsd"));
    // LM only sees the first 14 bytes.
    round_trip::<LmHash>(b"horse", &Settings::new());
    round_trip_for::<Msdcc>(secret, "Administrator");
    round_trip_for::<Msdcc2>(secret, "Administrator");
}

#[rstest]
#[case("$scram$4096$QSXCR.Q6sek8bf92$sha-1=HZbuOlKbWl.eR8AfIposuKbhX30", "scram")]
#[case(
    "pbkdf2_sha256$10000$seasalt$CWWFdHOWwPnki7HvkcqN9iA2T3KLW1cf2uZ5kvArtVY=",
    "django_pbkdf2_sha256"
)]
#[case("pbkdf2_sha1$10000$seasalt$oAfF6vgs95ncksAhGXOWf4Okq7o=", "django_pbkdf2_sha1")]
#[case("sha1$seasalt$cff36ea83f5706ce9aa7454e63e431fc726b2dc8", "django_salted_sha1")]
#[case("md5$seasalt$3f86d0d3d465b7b458c231bf3555c0e3", "django_salted_md5")]
#[case("!", "django_disabled")]
#[case("{MD5}X03MO1qnZdYdgyfeuILPmQ==", "ldap_md5")]
#[case("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=", "ldap_sha1")]
#[case("{SMD5}nXuh5+7dhsJMIAfcer5MygECAwQ=", "ldap_salted_md5")]
#[case("{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgME", "ldap_salted_sha1")]
#[case("$3$$8846f7eaee8fb117ad06bdd830b7586c", "nthash")]
fn exactly_one_scheme_identifies(#[case] hash: &str, #[case] scheme: &str) {
    assert_eq!(identify_all(hash), vec![scheme]);
}

#[test]
fn bare_hex_is_claimed_by_every_hex_scheme() {
    assert_eq!(
        identify_all("8846F7EAEE8FB117AD06BDD830B7586C"),
        vec!["lmhash", "nthash", "msdcc", "msdcc2"]
    );
    assert!(NtHash::verify(b"password", "8846F7EAEE8FB117AD06BDD830B7586C").unwrap());
    assert!(!LmHash::verify(b"password", "8846f7eaee8fb117ad06bdd830b7586c").unwrap());
}

#[rstest]
#[case("secret", true)]
#[case("8846f7eaee8fb117ad06bdd830b7586c", true)]
#[case("{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=", false)]
#[case("{CRYPT}$1$abc", false)]
#[case("", false)]
fn plaintext_claims_values_without_scheme_prefix(#[case] hash: &str, #[case] claimed: bool) {
    assert_eq!(LdapPlaintext::identify(hash), claimed);
}

#[rstest]
#[case("")]
#[case("$1$abcdefgh$0123456789abcdef012345")]
#[case("not a hash")]
fn nobody_identifies(#[case] hash: &str) {
    assert!(identify_all(hash).is_empty());
}

#[test]
fn verify_reports_unusable_hashes_opaquely() {
    assert_eq!(
        DjangoSaltedSha1::verify(b"x", ""),
        Err(Error::NoHashSupplied)
    );
    assert_eq!(
        DjangoSaltedSha1::verify(b"x", "md5$abc$def"),
        Err(Error::InvalidHash {
            scheme: "django_salted_sha1"
        })
    );
    assert_eq!(
        Scram::verify(b"x", "$scram$abc"),
        Err(Error::InvalidHash { scheme: "scram" })
    );
    assert_eq!(
        NtHash::verify(b"x", "zz"),
        Err(Error::InvalidHash { scheme: "nthash" })
    );
}

#[test]
fn parsing_reports_the_cause() {
    assert_eq!(
        DjangoPbkdf2Sha256::from_string("sha1$abc$def"),
        Err(Error::InvalidHashPrefix {
            scheme: "django_pbkdf2_sha256"
        })
    );
    assert_eq!(
        DjangoPbkdf2Sha256::from_string(""),
        Err(Error::MalformedHash {
            scheme: "django_pbkdf2_sha256",
            reason: "empty hash"
        })
    );
}

#[test]
fn zero_padded_rounds_are_malformed() {
    let padded = "pbkdf2_sha256$05000$seasalt$CWWFdHOWwPnki7HvkcqN9iA2T3KLW1cf2uZ5kvArtVY=";
    assert_eq!(
        DjangoPbkdf2Sha256::from_string(padded),
        Err(Error::MalformedHash {
            scheme: "django_pbkdf2_sha256",
            reason: "zero-padded rounds field"
        })
    );
    let canonical = padded.replacen("05000", "5000", 1);
    assert_eq!(
        DjangoPbkdf2Sha256::from_string(&canonical).unwrap().rounds(),
        5000
    );
}

#[test]
fn oversized_salt_truncates_or_fails() {
    let salt = vec![7u8; 1025];
    let lenient = Scram::genconfig(&Settings::new().salt(&salt)).unwrap();
    assert_eq!(
        lenient.advisories(),
        &[Advisory::SaltTruncated {
            scheme: "scram",
            from: 1025,
            to: 1024
        }]
    );
    assert_eq!(Scram::from_string(&lenient).unwrap().salt(), &salt[..1024]);

    assert_eq!(
        Scram::genconfig(&Settings::new().salt(&salt).strict(true)),
        Err(Error::SaltTooLong {
            scheme: "scram",
            max: 1024
        })
    );
}

#[test]
fn out_of_range_rounds_clamp_or_fail() {
    let lenient = DjangoPbkdf2Sha256::genconfig(&Settings::new().rounds(0)).unwrap();
    assert_eq!(
        lenient.advisories(),
        &[Advisory::RoundsClamped {
            scheme: "django_pbkdf2_sha256",
            requested: 0,
            applied: 1
        }]
    );
    assert_eq!(DjangoPbkdf2Sha256::from_string(&lenient).unwrap().rounds(), 1);

    assert_eq!(
        DjangoPbkdf2Sha256::genconfig(&Settings::new().rounds(0).strict(true)),
        Err(Error::RoundsTooLow {
            scheme: "django_pbkdf2_sha256",
            min: 1
        })
    );
}

#[test]
fn strict_mode_requires_explicit_settings() {
    assert_eq!(
        DjangoPbkdf2Sha256::genconfig(&Settings::new().salt("abc").strict(true)),
        Err(Error::MissingParameter {
            scheme: "django_pbkdf2_sha256",
            field: Field::Rounds
        })
    );
    assert_eq!(
        DjangoSaltedSha1::genconfig(&Settings::new().strict(true)),
        Err(Error::MissingParameter {
            scheme: "django_salted_sha1",
            field: Field::Salt
        })
    );
    assert_eq!(
        DjangoSaltedSha1::genconfig(&Settings::new().rounds(5)),
        Err(Error::UnsupportedSetting {
            scheme: "django_salted_sha1",
            field: Field::Rounds
        })
    );
}

#[test]
fn default_django_pbkdf2_hash() {
    let hash = DjangoPbkdf2Sha256::encrypt(b"password", &Settings::new())
        .unwrap()
        .into_inner();
    assert_eq!(hash.len(), 77);

    let parsed = DjangoPbkdf2Sha256::from_string(&hash).unwrap();
    assert_eq!(parsed.rounds(), 10000);
    assert_eq!(parsed.salt().len(), 12);
    assert!(parsed.salt().chars().all(|c| SALT_CHARS.contains(c)));
    assert!(DjangoPbkdf2Sha256::verify(b"password", &hash).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn any_secret_round_trips(secret in "[ -~]{0,24}") {
        let secret = secret.as_bytes();
        let cheap = Settings::new().rounds(1);
        let scram = Scram::encrypt(secret, &cheap).unwrap().into_inner();
        prop_assert!(Scram::verify(secret, &scram).unwrap());
        prop_assert!(Scram::verify_full(secret, &scram).unwrap().into_inner());
        let django = DjangoPbkdf2Sha256::encrypt(secret, &cheap).unwrap().into_inner();
        prop_assert!(DjangoPbkdf2Sha256::verify(secret, &django).unwrap());
        prop_assert_eq!(
            Scram::verify(secret, &django),
            Err(Error::InvalidHash { scheme: "scram" })
        );
        let nt = NtHash::encrypt(secret, &Settings::new()).unwrap().into_inner();
        prop_assert!(NtHash::verify(secret, &nt).unwrap());
        let ssha = LdapSaltedSha1::encrypt(secret, &Settings::new()).unwrap().into_inner();
        prop_assert_eq!(LdapSaltedSha1::from_string(&ssha).unwrap().to_string(), ssha.clone());
        prop_assert!(LdapSaltedSha1::verify(secret, &ssha).unwrap());
    }

    #[test]
    fn django_salts_are_kept_verbatim(salt in "[a-zA-Z0-9]{1,40}") {
        let hash = DjangoSaltedSha1::encrypt(b"pw", &Settings::new().salt(salt.as_str()))
            .unwrap()
            .into_inner();
        let parsed = DjangoSaltedSha1::from_string(&hash).unwrap();
        prop_assert_eq!(parsed.salt(), salt.as_str());
    }
}
