// tests/catalog_scanner_test.rs

mod common;

use common::{CardSpec, FakeSession, add_course_card};
use echo_dl::{
    config::AppConfig,
    error::AppError,
    scraper::{CatalogScanner, CourseScraper},
};
use std::collections::BTreeSet;

fn codes(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_scan_single_card_with_shared_prefix_codes() {
    let config = AppConfig::default();
    let mut session = FakeSession::new();
    add_course_card(
        &mut session,
        &config,
        CardSpec {
            href: "/section/4f1c/home",
            lecture_count: "10",
            term_title: "Term 1",
            year_title: "2024 Term 1",
            info_title: "COMP6843/9417 - Data Analytics",
        },
    );

    let courses = CatalogScanner::new(&session, &config).scan().await.unwrap();

    assert_eq!(courses.len(), 1);
    let course = &courses[0];
    assert_eq!(course.course_codes, codes(&["COMP6843", "COMP9417"]));
    assert_eq!(course.course_name, "Data Analytics");
    assert_eq!(course.declared_lecture_count, 10);
    assert_eq!(course.year, "2024");
    assert_eq!(course.term, "1");
    assert_eq!(course.url, "https://echo360.net.au/section/4f1c/home");
    assert!(course.lectures().is_empty());
    assert_eq!(session.visited(), vec![common::COURSES_URL.to_string()]);
}

#[tokio::test]
async fn test_scan_skips_malformed_card_and_keeps_page_order() {
    let config = AppConfig::default();
    let mut session = FakeSession::new();
    add_course_card(
        &mut session,
        &config,
        CardSpec {
            href: "/section/a/home",
            lecture_count: "24 classes",
            term_title: "Term 3",
            year_title: "2023",
            info_title: "MATH1131 - Mathematics 1A",
        },
    );
    add_course_card(
        &mut session,
        &config,
        CardSpec {
            href: "/section/b/home",
            lecture_count: "5",
            term_title: "Term 3",
            year_title: "2023",
            info_title: "Orientation week",
        },
    );
    add_course_card(
        &mut session,
        &config,
        CardSpec {
            href: "https://echo360.net.au/section/c/home",
            lecture_count: "12",
            term_title: "Term 3",
            year_title: "2023",
            info_title: "COMP48XX/SEC1/SEC2 - Security Engineering",
        },
    );

    let courses = CatalogScanner::new(&session, &config).scan().await.unwrap();

    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].course_codes, codes(&["MATH1131"]));
    assert_eq!(courses[0].declared_lecture_count, 24);
    assert_eq!(courses[1].course_codes, codes(&["SEC1", "SEC2"]));
    assert_eq!(courses[1].course_name, "Security Engineering");
    assert_eq!(courses[1].url, "https://echo360.net.au/section/c/home");
}

#[tokio::test]
async fn test_scan_without_cards_is_fatal() {
    let config = AppConfig::default();
    let session = FakeSession::new();

    let err = CatalogScanner::new(&session, &config)
        .scan()
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Scan(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn test_build_catalog_registers_every_course() {
    let config = AppConfig::default();
    let mut session = FakeSession::new();
    for (href, info) in [
        ("/section/a/home", "COMP6843 - Web Security"),
        ("/section/b/home", "COMP9417 - Machine Learning"),
    ] {
        add_course_card(
            &mut session,
            &config,
            CardSpec {
                href,
                lecture_count: "8",
                term_title: "Term 2",
                year_title: "2024",
                info_title: info,
            },
        );
    }

    let catalog = CourseScraper::new(&session, &config)
        .build_catalog()
        .await
        .unwrap();

    assert_eq!(catalog.course_count(), 2);
    assert_eq!(catalog.lecture_count(), 0);
    let names: Vec<_> = catalog
        .courses()
        .map(|(_, c)| c.course_name.clone())
        .collect();
    assert_eq!(names, vec!["Web Security", "Machine Learning"]);
}
