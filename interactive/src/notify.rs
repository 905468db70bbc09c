use std::time::Duration;

use leptos::prelude::*;

const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub id: u64,
    pub tone: Tone,
    pub title: String,
    pub body: String,
}

/// Transient toasts shown in the corner of the page.
#[derive(Clone, Copy)]
pub struct Notices {
    list: RwSignal<Vec<Notice>>,
    next_id: StoredValue<u64>,
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

impl Notices {
    pub fn new() -> Self {
        Self {
            list: RwSignal::new(Vec::new()),
            next_id: StoredValue::new(0),
        }
    }

    /// Queues a notice and returns its id. Does not schedule dismissal.
    fn push_notice(&self, tone: Tone, title: &str, body: &str) -> u64 {
        let mut id = 0;
        self.next_id.update_value(|n| {
            *n += 1;
            id = *n;
        });
        self.list.update(|list| {
            list.push(Notice {
                id,
                tone,
                title: title.to_string(),
                body: body.to_string(),
            })
        });
        id
    }

    pub fn push(&self, tone: Tone, title: &str, body: &str) {
        let id = self.push_notice(tone, title, body);
        let notices = *self;
        set_timeout(move || notices.dismiss(id), NOTICE_TTL);
    }

    pub fn info(&self, title: &str, body: &str) {
        self.push(Tone::Info, title, body);
    }

    pub fn success(&self, title: &str, body: &str) {
        self.push(Tone::Success, title, body);
    }

    pub fn error(&self, title: &str, body: impl ToString) {
        self.push(Tone::Error, title, &body.to_string());
    }

    pub fn dismiss(&self, id: u64) {
        self.list.update(|list| list.retain(|n| n.id != id));
    }
}

#[component]
pub fn NoticeTray() -> impl IntoView {
    let notices = expect_context::<Notices>();

    view! {
        <div class="rewear-notices" aria-live="polite">
            <For
                each=move || notices.list.get()
                key=|n| n.id
                let:notice
            >
                <div
                    class="rewear-notice"
                    class:rewear-notice-success={notice.tone == Tone::Success}
                    class:rewear-notice-error={notice.tone == Tone::Error}
                    on:click=move |_| notices.dismiss(notice.id)
                >
                    <strong>{notice.title.clone()}</strong>
                    <p>{notice.body.clone()}</p>
                </div>
            </For>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_get_distinct_ids_and_dismiss_individually() {
        let notices = Notices::new();
        let first = notices.push_notice(Tone::Success, "Added to Cart", "Vintage Denim Jacket");
        let second = notices.push_notice(Tone::Error, "Error", "Network error");
        assert_ne!(first, second);

        notices.dismiss(first);
        let left = notices.list.get_untracked();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].tone, Tone::Error);
    }
}
