//! In-memory host page and scripted event source for unit tests.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tokio::time::{Duration, Instant, sleep_until};
use url::Url;

use crate::config::PageLayout;
use crate::injector::Injector;
use crate::page::{FrameHandle, HostPage, HostSnapshot, PageError};
use crate::protocol::HostEvent;
use crate::watcher::ChangeNotifier;

pub const REPORT_URL: &str = "https://www.warcraftlogs.com/reports/R123?fight=last&source=S7";

const BODY: &str = "body";
const TAB_BAR: &str = "top-level-view-tabs";
const CONTENT: &str = "report-view-contents";

pub fn injector(page: FakePage) -> Injector<FakePage> {
    let base = Url::parse("http://localhost:5173").expect("base url");
    Injector::new(page, PageLayout::default(), base)
}

pub fn snapshot(href: &str) -> HostSnapshot {
    HostSnapshot {
        href: href.to_string(),
        present: Vec::new(),
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FakeElement {
    node: u64,
    parent: String,
    visible: bool,
    selected: bool,
    label: Option<String>,
    src: Option<String>,
    height: Option<f64>,
}

/// A tiny DOM: elements by id, child order per parent, body classes.
///
/// `mutations` counts only writes that changed something, so idempotence can be
/// asserted by comparing clones.
#[derive(Debug, Clone, PartialEq)]
pub struct FakePage {
    href: String,
    elements: BTreeMap<String, FakeElement>,
    children: BTreeMap<String, Vec<String>>,
    body_classes: BTreeSet<String>,
    next_node: u64,
    pub mutations: usize,
    pub height_writes: usize,
}

impl FakePage {
    pub fn report_view(href: &str) -> Self {
        let mut page = Self {
            href: href.to_string(),
            elements: BTreeMap::new(),
            children: BTreeMap::new(),
            body_classes: BTreeSet::from(["compare".to_string()]),
            next_node: 1,
            mutations: 0,
            height_writes: 0,
        };
        page.attach(BODY, TAB_BAR, 0);
        page.attach(TAB_BAR, "summary-tab", 0);
        page.attach(BODY, CONTENT, 1);
        page
    }

    pub fn navigate(&mut self, href: &str) {
        self.href = href.to_string();
    }

    pub fn detach(&mut self, id: &str) {
        if let Some(element) = self.elements.remove(id) {
            if let Some(siblings) = self.children.get_mut(&element.parent) {
                siblings.retain(|child| child != id);
            }
        }
        for child in self.children.remove(id).unwrap_or_default() {
            self.detach(&child);
        }
    }

    pub fn restore_tab_bar(&mut self) {
        self.attach(BODY, TAB_BAR, 0);
    }

    pub fn node_of(&self, id: &str) -> Option<u64> {
        self.elements.get(id).map(|element| element.node)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|element| element.visible)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|element| element.selected)
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.body_classes.contains(class)
    }

    pub fn src_of(&self, id: &str) -> Option<&str> {
        self.elements.get(id)?.src.as_deref()
    }

    pub fn height_of(&self, id: &str) -> Option<f64> {
        self.elements.get(id)?.height
    }

    pub fn label_of(&self, id: &str) -> Option<&str> {
        self.elements.get(id)?.label.as_deref()
    }

    pub fn first_child_of(&self, parent: &str) -> Option<&str> {
        self.children.get(parent)?.first().map(String::as_str)
    }

    pub fn previous_sibling_of(&self, id: &str) -> Option<&str> {
        let parent = &self.elements.get(id)?.parent;
        let siblings = self.children.get(parent)?;
        let index = siblings.iter().position(|child| child == id)?;
        siblings.get(index.checked_sub(1)?).map(String::as_str)
    }

    pub fn frame_count(&self) -> usize {
        self.elements.values().filter(|element| element.src.is_some()).count()
    }

    fn attach(&mut self, parent: &str, id: &str, index: usize) -> u64 {
        let node = self.next_node;
        self.next_node += 1;
        self.elements.insert(
            id.to_string(),
            FakeElement {
                node,
                parent: parent.to_string(),
                visible: true,
                selected: false,
                label: None,
                src: None,
                height: None,
            },
        );
        let siblings = self.children.entry(parent.to_string()).or_default();
        siblings.insert(index.min(siblings.len()), id.to_string());
        node
    }

    fn element_mut(&mut self, id: &str) -> Result<&mut FakeElement, PageError> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| PageError::MissingElement(id.to_string()))
    }

    fn frame_id(&self, frame: FrameHandle) -> Result<String, PageError> {
        self.elements
            .iter()
            .find(|(_, element)| element.node == frame.0)
            .map(|(id, _)| id.clone())
            .ok_or(PageError::UnknownFrame(frame))
    }
}

impl HostPage for FakePage {
    fn refresh(&mut self, snapshot: HostSnapshot) {
        // The fake's own element tree is authoritative; only the location moves.
        self.href = snapshot.href;
    }

    fn location(&self) -> &str {
        &self.href
    }

    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn set_visible(&mut self, id: &str, visible: bool) -> Result<(), PageError> {
        let element = self.element_mut(id)?;
        if element.visible != visible {
            element.visible = visible;
            self.mutations += 1;
        }
        Ok(())
    }

    fn set_selected(&mut self, id: &str, selected: bool) -> Result<(), PageError> {
        let element = self.element_mut(id)?;
        if element.selected != selected {
            element.selected = selected;
            self.mutations += 1;
        }
        Ok(())
    }

    fn remove_body_class(&mut self, class: &str) -> Result<(), PageError> {
        if self.body_classes.remove(class) {
            self.mutations += 1;
        }
        Ok(())
    }

    fn insert_trigger(&mut self, tab_bar: &str, id: &str, label: &str) -> Result<(), PageError> {
        if !self.contains(tab_bar) {
            return Err(PageError::MissingElement(tab_bar.to_string()));
        }
        self.attach(tab_bar, id, 0);
        self.element_mut(id)?.label = Some(label.to_string());
        self.mutations += 1;
        Ok(())
    }

    fn insert_frame(
        &mut self,
        before: &str,
        id: &str,
        src: &str,
    ) -> Result<FrameHandle, PageError> {
        let parent = self
            .elements
            .get(before)
            .map(|element| element.parent.clone())
            .ok_or_else(|| PageError::MissingElement(before.to_string()))?;
        let index = self
            .children
            .get(&parent)
            .and_then(|siblings| siblings.iter().position(|child| child == before))
            .unwrap_or(0);

        let node = self.attach(&parent, id, index);
        self.element_mut(id)?.src = Some(src.to_string());
        self.mutations += 1;
        Ok(FrameHandle(node))
    }

    fn set_frame_source(&mut self, frame: FrameHandle, src: &str) -> Result<(), PageError> {
        let id = self.frame_id(frame)?;
        let element = self.element_mut(&id)?;
        if element.src.as_deref() != Some(src) {
            element.src = Some(src.to_string());
            self.mutations += 1;
        }
        Ok(())
    }

    fn set_frame_height(&mut self, frame: FrameHandle, px: f64) -> Result<(), PageError> {
        let id = self.frame_id(frame)?;
        self.element_mut(&id)?.height = Some(px);
        self.height_writes += 1;
        self.mutations += 1;
        Ok(())
    }

    fn remove_frame(&mut self, frame: FrameHandle) -> Result<(), PageError> {
        let id = self.frame_id(frame)?;
        self.detach(&id);
        self.mutations += 1;
        Ok(())
    }
}

pub struct ScriptedNotifier {
    start: Instant,
    script: VecDeque<(Duration, HostEvent)>,
    pub unsubscribed: bool,
}

impl ScriptedNotifier {
    pub fn new(script: impl IntoIterator<Item = (u64, HostEvent)>) -> Self {
        Self {
            start: Instant::now(),
            script: script
                .into_iter()
                .map(|(at_ms, event)| (Duration::from_millis(at_ms), event))
                .collect(),
            unsubscribed: false,
        }
    }
}

impl ChangeNotifier for ScriptedNotifier {
    async fn next_event(&mut self) -> Option<HostEvent> {
        let (at, _) = self.script.front()?;
        sleep_until(self.start + *at).await;
        self.script.pop_front().map(|(_, event)| event)
    }

    fn unsubscribe(&mut self) {
        self.unsubscribed = true;
        self.script.clear();
    }
}
