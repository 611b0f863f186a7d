// ============================================================
// Layer 5 — Classification Heads
// ============================================================
// One optional head per task. A head is a linear projection
// hidden → classes followed by a leaky ReLU.
//
// Heads naturally produce [batch, words, classes]. Loss and
// accuracy code expects the class axis right after the batch
// axis, so every logits tensor is returned as
//
//   [batch, classes, words]
//
// A disabled task has no head at all and yields `None`, never a
// zero tensor.

use burn::{
    nn::{LeakyRelu, LeakyReluConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::domain::task::{TagsetSizes, Task};

// ─── ClassifierConfig ─────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub hidden_size: usize,
    #[config(default = true)]
    pub use_upos: bool,
    #[config(default = true)]
    pub use_xpos: bool,
    #[config(default = true)]
    pub use_lemma: bool,
    #[config(default = true)]
    pub use_feats: bool,
    // `2` is a placeholder; the data layer reports the real sizes.
    #[config(default = 2)]
    pub upos_out_size: usize,
    #[config(default = 2)]
    pub xpos_out_size: usize,
    #[config(default = 2)]
    pub lemma_out_size: usize,
    #[config(default = 2)]
    pub feats_out_size: usize,
}

impl ClassifierConfig {
    /// Inject the class counts discovered from the label vocabulary.
    pub fn with_tagset_sizes(self, sizes: TagsetSizes) -> Self {
        self.with_upos_out_size(sizes.upos)
            .with_xpos_out_size(sizes.xpos)
            .with_lemma_out_size(sizes.lemma)
            .with_feats_out_size(sizes.feats)
    }

    pub fn enabled(&self, task: Task) -> bool {
        match task {
            Task::Upos  => self.use_upos,
            Task::Xpos  => self.use_xpos,
            Task::Lemma => self.use_lemma,
            Task::Feats => self.use_feats,
        }
    }

    pub fn out_size(&self, task: Task) -> usize {
        match task {
            Task::Upos  => self.upos_out_size,
            Task::Xpos  => self.xpos_out_size,
            Task::Lemma => self.lemma_out_size,
            Task::Feats => self.feats_out_size,
        }
    }

    fn make_head<B: Backend>(&self, task: Task, device: &B::Device) -> Option<ClassificationHead<B>> {
        self.enabled(task).then(|| ClassificationHead {
            linear:     LinearConfig::new(self.hidden_size, self.out_size(task)).init(device),
            activation: LeakyReluConfig::new().init(),
        })
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        let enabled: Vec<String> = Task::ALL
            .iter()
            .filter(|t| self.enabled(**t))
            .map(|t| format!("{}({})", t, self.out_size(*t)))
            .collect();
        tracing::info!("Classifier heads: [{}]", enabled.join(", "));

        Classifier {
            upos:  self.make_head(Task::Upos, device),
            xpos:  self.make_head(Task::Xpos, device),
            lemma: self.make_head(Task::Lemma, device),
            feats: self.make_head(Task::Feats, device),
        }
    }
}

// ─── ClassificationHead ───────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct ClassificationHead<B: Backend> {
    pub linear:     Linear<B>,
    pub activation: LeakyRelu,
}

impl<B: Backend> ClassificationHead<B> {
    pub fn num_classes(&self) -> usize {
        self.linear.weight.val().dims()[1]
    }

    /// [batch, words, hidden] → [batch, words, classes]
    pub fn forward_words(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.activation.forward(self.linear.forward(x))
    }

    /// [batch, words, hidden] → [batch, classes, words]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        self.forward_words(x).swap_dims(1, 2)
    }
}

// ─── Classifier ───────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub upos:  Option<ClassificationHead<B>>,
    pub xpos:  Option<ClassificationHead<B>>,
    pub lemma: Option<ClassificationHead<B>>,
    pub feats: Option<ClassificationHead<B>>,
}

impl<B: Backend> Classifier<B> {
    pub fn head(&self, task: Task) -> Option<&ClassificationHead<B>> {
        match task {
            Task::Upos  => self.upos.as_ref(),
            Task::Xpos  => self.xpos.as_ref(),
            Task::Lemma => self.lemma.as_ref(),
            Task::Feats => self.feats.as_ref(),
        }
    }

    pub fn uses(&self, task: Task) -> bool {
        self.head(task).is_some()
    }

    pub fn forward(&self, embeddings: Tensor<B, 3>) -> Logits<B> {
        let apply = |task| self.head(task).map(|head| head.forward(embeddings.clone()));
        Logits {
            upos:  apply(Task::Upos),
            xpos:  apply(Task::Xpos),
            lemma: apply(Task::Lemma),
            feats: apply(Task::Feats),
        }
    }
}

// ─── Logits ───────────────────────────────────────────────────────────────────
/// Per-task logits, each [batch, classes, words] when present.
#[derive(Debug, Clone)]
pub struct Logits<B: Backend> {
    pub upos:  Option<Tensor<B, 3>>,
    pub xpos:  Option<Tensor<B, 3>>,
    pub lemma: Option<Tensor<B, 3>>,
    pub feats: Option<Tensor<B, 3>>,
}

impl<B: Backend> Logits<B> {
    pub fn get(&self, task: Task) -> Option<&Tensor<B, 3>> {
        match task {
            Task::Upos  => self.upos.as_ref(),
            Task::Xpos  => self.xpos.as_ref(),
            Task::Lemma => self.lemma.as_ref(),
            Task::Feats => self.feats.as_ref(),
        }
    }

    pub fn present_tasks(&self) -> Vec<Task> {
        Task::ALL.into_iter().filter(|t| self.get(*t).is_some()).collect()
    }
}
