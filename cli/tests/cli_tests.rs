fn cases(glob: &str) {
    trycmd::TestCases::new()
        .case(glob)
        .env("COUNTS_ALLOW_STDIN", "true")
        .default_bin_name("counts");
}

#[test]
fn msa_to_counts() {
    cases("tests/msa-to-counts/*.toml");
}

#[test]
fn vcf_to_counts() {
    cases("tests/vcf-to-counts/*.toml");
}

#[test]
fn counts_to_fasta() {
    cases("tests/counts-to-fasta/*.toml");
}

#[test]
fn filter_msa() {
    cases("tests/filter-msa/*.toml");
}

#[test]
fn model_input() {
    cases("tests/model-input/*.toml");
}
