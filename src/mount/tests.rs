use super::*;
use crate::page::{BannerKind, UpdateKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

fn setup(markup: &str) -> (SharedPage, Arc<BehaviorRegistry>, Mounter) {
    let page = Page::new(Url::parse("http://site.test/").unwrap(), Document::parse(markup)).shared();
    let registry = Arc::new(BehaviorRegistry::new());
    let mounter = Mounter::new(&page, Arc::clone(&registry), MountOptions::default());
    (page, registry, mounter)
}

fn event(kind: UpdateKind) -> PageEvent {
    PageEvent::new(kind, Url::parse("http://site.test/").unwrap())
}

#[test]
fn test_mount_fills_container_and_pins_it() {
    let (page, _, mounter) = setup(r#"<div id="box" class="c"><p>old</p></div><p>outside</p>"#);
    let mut page = page.lock();
    let container = page.document.find_by_id("box").unwrap();

    mounter
        .mount(
            &mut page,
            container,
            Document::parse("<p>new</p><span>more</span>"),
            &event(UpdateKind::Mount),
        )
        .unwrap();

    assert_eq!(
        page.document.to_html(),
        r#"<div id="box" class="c"><p>new</p><span>more</span></div><p>outside</p>"#
    );
    let flags = &page.document.element(container).unwrap().flags;
    assert!(flags.live_update.is_preserve());
}

#[test]
fn test_mount_rejects_stale_container() {
    let (page, _, mounter) = setup(r#"<div id="box"></div>"#);
    let mut page = page.lock();
    let container = page.document.find_by_id("box").unwrap();
    page.document.detach(container);
    page.document.free_subtree(container);

    let err = mounter
        .mount(&mut page, container, Document::new(), &event(UpdateKind::Mount))
        .unwrap_err();
    assert!(matches!(err, MountError::Container));
}

#[test]
fn test_behaviors_receive_element_and_args() {
    let (page, registry, mounter) = setup(r#"<div id="box"></div>"#);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    registry.register("label", move |call| {
        let text = call.str_arg(0).unwrap_or_default().to_string();
        call.document.set_attr(call.element, "aria-label", &text);
        log.lock().push((text, call.u64_arg(1)));
        Ok(())
    });

    let mut page = page.lock();
    let container = page.document.find_by_id("box").unwrap();
    mounter
        .mount(
            &mut page,
            container,
            Document::parse(r#"<button data-behavior='["label", "Save", 3]'>s</button><i data-behavior='["missing"]'></i>"#),
            &event(UpdateKind::Mount),
        )
        .unwrap();

    assert_eq!(*seen.lock(), vec![("Save".to_string(), Some(3))]);
    let button = page.document.find(|el| el.tag == "button").unwrap();
    assert_eq!(
        page.document.element(button).unwrap().attrs.get("aria-label"),
        Some("Save")
    );
}

#[test]
fn test_malformed_descriptor_is_an_error() {
    let (page, _, mounter) = setup(r#"<div id="box"></div>"#);
    let mut page = page.lock();
    let container = page.document.find_by_id("box").unwrap();

    let err = mounter
        .mount(
            &mut page,
            container,
            Document::parse(r#"<p data-behavior="not json"></p>"#),
            &event(UpdateKind::Mount),
        )
        .unwrap_err();
    assert!(matches!(err, MountError::Descriptor { .. }));
    // The container is pinned even when a behavior fails
    assert!(
        page.document
            .element(container)
            .unwrap()
            .flags
            .live_update
            .is_preserve()
    );
}

#[test]
fn test_failing_behavior_propagates() {
    let (page, registry, mounter) = setup("");
    registry.register("boom", |_| anyhow::bail!("exploded"));

    let mut page = page.lock();
    let err = mounter
        .document_mount(
            &mut page,
            Document::parse(r#"<p data-behavior='["boom"]'></p>"#),
            &event(UpdateKind::Navigation),
        )
        .unwrap_err();
    match err {
        MountError::Behavior { name, source } => {
            assert_eq!(name, "boom");
            assert_eq!(source.to_string(), "exploded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_push_skips_behaviors_under_pinned_ancestor() {
    let markup = r#"<section id="pinned"><p data-behavior='["count"]'>a</p></section><p data-behavior='["count"]'>b</p>"#;
    let (page, registry, mounter) = setup(markup);
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry.register("count", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let mut page = page.lock();
    let pinned = page.document.find_by_id("pinned").unwrap();
    page.document.set_live_update(pinned, LiveUpdate::Preserve);

    mounter
        .document_mount(&mut page, Document::parse(markup), &event(UpdateKind::Push))
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    mounter
        .document_mount(
            &mut page,
            Document::parse(markup),
            &event(UpdateKind::Navigation),
        )
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_document_mount_version_skew() {
    let (page, _, mounter) = setup(
        r#"<meta name="version" content="1"><form><input name="q"></form><p>old</p>"#,
    );
    let mut page = page.lock();
    let input = page.document.find(|el| el.tag == "input").unwrap();
    page.document.set_value(input, "draft");
    let before = page.document.to_html();

    let err = mounter
        .document_mount(
            &mut page,
            Document::parse(r#"<meta name="version" content="2"><p>new</p>"#),
            &event(UpdateKind::Push),
        )
        .unwrap_err();

    assert!(matches!(
        err,
        MountError::VersionSkew { ref live, ref incoming }
            if live.as_deref() == Some("1") && incoming.as_deref() == Some("2")
    ));
    assert_eq!(page.document.to_html(), before);
    assert!(!page.document.has_modified());
    assert_eq!(
        page.banner.as_ref().map(|b| b.kind),
        Some(BannerKind::VersionSkew)
    );
}

#[test]
fn test_document_mount_morphs_and_dispatches() {
    let (page, _, mounter) = setup(r#"<meta name="version" content="1"><p>old</p>"#);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    page.lock().listen(move |event| log.lock().push(event.kind));

    let mut page = page.lock();
    let p = page.document.find(|el| el.tag == "p").unwrap();
    mounter
        .document_mount(
            &mut page,
            Document::parse(r#"<meta name="version" content="1"><p>new</p>"#),
            &event(UpdateKind::Navigation),
        )
        .unwrap();

    assert_eq!(page.document.text_content(p), "new");
    assert_eq!(*seen.lock(), vec![UpdateKind::Navigation]);
    assert!(page.banner.is_none());
}

#[test]
fn test_missing_version_marker_matches() {
    let (page, _, mounter) = setup(r#"<meta name="version" content="1"><p>a</p>"#);
    let mut page = page.lock();
    mounter
        .document_mount(
            &mut page,
            Document::parse("<p>b</p>"),
            &event(UpdateKind::Navigation),
        )
        .unwrap();
    assert_eq!(page.document.to_html(), "<p>b</p>");
}

#[tokio::test(start_paused = true)]
async fn test_behavior_starts_attached_job() {
    let (page, registry, mounter) = setup(r#"<div id="box"></div>"#);
    let ticks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ticks);
    registry.register("tick", move |call| {
        let ms = call.u64_arg(0).unwrap_or(1000);
        let counter = Arc::clone(&counter);
        call.jobs.every(
            call.element,
            std::time::Duration::from_millis(ms),
            0.0,
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {}
            },
        );
        Ok(())
    });

    {
        let mut page = page.lock();
        let container = page.document.find_by_id("box").unwrap();
        mounter
            .mount(
                &mut page,
                container,
                Document::parse(r#"<span data-behavior='["tick", 100]'></span>"#),
                &event(UpdateKind::Mount),
            )
            .unwrap();
    }

    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
    assert_eq!(mounter.jobs().len(), 1);

    // Removing the owner stops the job at its next run
    {
        let mut page = page.lock();
        let container = page.document.find_by_id("box").unwrap();
        mounter
            .mount(&mut page, container, Document::new(), &event(UpdateKind::Mount))
            .unwrap();
    }
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
    assert!(mounter.jobs().is_empty());
}
