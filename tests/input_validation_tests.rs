use deckhand::tui::validation;

#[test]
fn site_name_rejects_uppercase_and_spaces() {
    assert!(validation::site_name("blog").is_ok());
    assert!(validation::site_name("my_shop-2").is_ok());
    assert!(validation::site_name("Blog").is_err());
    assert!(validation::site_name("my shop").is_err());
    assert!(validation::site_name("").is_err());
}

#[test]
fn domain_requires_a_dot_and_no_whitespace() {
    assert!(validation::domain("blog.test").is_ok());
    assert!(validation::domain("shop.example.com").is_ok());
    assert!(validation::domain("localhost").is_err());
    assert!(validation::domain("bad domain.test").is_err());
}

#[test]
fn repo_url_accepts_https_and_scp_shapes() {
    assert!(validation::repo_url_optional("https://github.com/acme/shop.git").is_ok());
    assert!(validation::repo_url_optional("git@github.com:acme/shop.git").is_ok());
    assert!(validation::repo_url_optional("ssh://git@gitlab.com/acme/shop.git").is_ok());
}

#[test]
fn repo_url_allows_empty_but_rejects_junk() {
    assert!(validation::repo_url_optional("").is_ok());
    assert!(validation::repo_url_optional("definitely not a url").is_err());
    assert!(validation::repo_url_optional("ftp://example.com/x").is_err());
    assert!(validation::repo_url_optional("git@github.com").is_err());
}

#[test]
fn db_identifier_is_strict() {
    assert!(validation::db_identifier("blog_prod").is_ok());
    assert!(validation::db_identifier("blog-prod").is_err());
    assert!(validation::db_identifier("BLOG").is_err());
}

#[test]
fn secret_minimum_length_is_enforced() {
    assert!(validation::secret("1234567").is_err());
    assert!(validation::secret("12345678").is_ok());
}

#[test]
fn count_allows_empty_for_defaulted_fields() {
    assert!(validation::count_optional("").is_ok());
    assert!(validation::count_optional("12").is_ok());
    assert!(validation::count_optional("twelve").is_err());
}

#[test]
fn port_bounds() {
    assert!(validation::port("22").is_ok());
    assert!(validation::port("65535").is_ok());
    assert!(validation::port("0").is_err());
    assert!(validation::port("70000").is_err());
    assert!(validation::port("").is_err());
}
