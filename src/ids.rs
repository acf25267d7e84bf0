//! Identifier scheme: stable, commit-scoped identifiers.
//!
//! All functions here are pure. Reproducibility across builds comes from
//! these derivations being deterministic, not from any persisted state:
//! the same (repo, commit, path/symbol) tuple always yields the same IRI.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::graph::Term;

/// Everything except unreserved characters is encoded, including `/`.
const IRI_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Percent-encode a path or qualified name for use inside an IRI.
pub fn encode_for_iri(value: &str) -> String {
    utf8_percent_encode(value, IRI_SEGMENT).to_string()
}

/// Forward-slashed relative path without leading separators.
pub fn normalize_relative(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

pub fn repo_iri(repo_name: &str) -> Term {
    Term::iri(format!("laco://repo/{}", repo_name))
}

pub fn commit_iri(repo_name: &str, commit_sha: &str) -> Term {
    Term::iri(format!("laco://repo/{}/commit/{}", repo_name, commit_sha))
}

/// Identity of a source file: one per distinct path per build.
pub fn file_iri(repo_name: &str, commit_sha: &str, relative_path: &str) -> Term {
    Term::iri(format!(
        "laco://repo/{}/commit/{}/file/{}",
        repo_name,
        commit_sha,
        encode_for_iri(&normalize_relative(relative_path))
    ))
}

/// Identity of a declared unit, keyed by its build-wide symbol id.
pub fn unit_iri(repo_name: &str, commit_sha: &str, symbol_id: &str) -> Term {
    Term::iri(format!(
        "laco://sym/{}/{}/{}",
        repo_name, commit_sha, symbol_id
    ))
}

/// Placeholder identity for a referenced-but-undeclared qualified name.
pub fn dangling_iri(repo_name: &str, commit_sha: &str, qualified_name: &str) -> Term {
    Term::iri(format!(
        "laco://sym/{}/{}/dangling/{}",
        repo_name,
        commit_sha,
        encode_for_iri(qualified_name)
    ))
}

/// Identity of an external package reference. The raw specifier string is
/// the key: distinct literal strings are distinct entities, by design of
/// the scheme (no normalization).
pub fn package_iri(specifier: &str) -> Term {
    Term::iri(format!("laco://pkg/{}", encode_for_iri(specifier)))
}

/// Identity of an unresolved external import target.
pub fn external_iri(specifier: &str) -> Term {
    Term::iri(format!("laco://ext/{}", encode_for_iri(specifier)))
}

/// Flatten a relative path into a single filename-safe shard token.
pub fn flatten_relative_path(path: &str) -> String {
    let normalized = normalize_relative(path);
    if normalized.is_empty() {
        return "_".to_string();
    }
    let parts: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
    parts.join("__")
}

#[cfg(test)]
mod tests {
    use super::*;

    mod encoding {
        use super::*;

        #[test]
        fn slashes_and_brackets_are_encoded() {
            assert_eq!(
                encode_for_iri("app/blog/[slug]/page.tsx"),
                "app%2Fblog%2F%5Bslug%5D%2Fpage.tsx"
            );
        }

        #[test]
        fn unreserved_characters_pass_through() {
            assert_eq!(encode_for_iri("a_b.c-d~e"), "a_b.c-d~e");
        }
    }

    mod identity {
        use super::*;

        #[test]
        fn file_iri_is_deterministic() {
            let a = file_iri("repo", "abc123", "app/home/page.tsx");
            let b = file_iri("repo", "abc123", "app/home/page.tsx");
            assert_eq!(a, b);
            assert_eq!(
                a.as_iri().unwrap(),
                "laco://repo/repo/commit/abc123/file/app%2Fhome%2Fpage.tsx"
            );
        }

        #[test]
        fn backslashes_normalize_to_same_identity() {
            assert_eq!(
                file_iri("r", "c", "app\\home\\page.tsx"),
                file_iri("r", "c", "app/home/page.tsx")
            );
        }

        #[test]
        fn unit_and_dangling_iris() {
            assert_eq!(
                unit_iri("r", "c", "sym1").as_iri().unwrap(),
                "laco://sym/r/c/sym1"
            );
            assert_eq!(
                dangling_iri("r", "c", "lib.data.fetchData").as_iri().unwrap(),
                "laco://sym/r/c/dangling/lib.data.fetchData"
            );
        }

        #[test]
        fn distinct_package_specifiers_are_distinct() {
            assert_ne!(package_iri("react"), package_iri("react/"));
            assert_eq!(
                package_iri("@scope/pkg").as_iri().unwrap(),
                "laco://pkg/%40scope%2Fpkg"
            );
        }
    }

    mod flattening {
        use super::*;

        #[test]
        fn joins_segments_with_double_underscore() {
            assert_eq!(
                flatten_relative_path("app/home/page.tsx"),
                "app__home__page.tsx"
            );
        }

        #[test]
        fn empty_path_flattens_to_underscore() {
            assert_eq!(flatten_relative_path(""), "_");
            assert_eq!(flatten_relative_path("///"), "_");
        }
    }
}
