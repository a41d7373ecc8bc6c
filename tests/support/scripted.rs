use std::cell::RefCell;
use std::rc::Rc;

use digitpad::inference::{Classifier, InferenceError, InputTensor};

/// Classifier that answers with fixed scores and remembers what it was fed.
#[derive(Clone)]
pub struct ScriptedClassifier {
    scores: Vec<f32>,
    inputs: Rc<RefCell<Vec<InputTensor>>>,
}

impl ScriptedClassifier {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            inputs: Rc::default(),
        }
    }

    pub fn inputs(&self) -> Rc<RefCell<Vec<InputTensor>>> {
        Rc::clone(&self.inputs)
    }
}

impl Classifier for ScriptedClassifier {
    fn device_label(&self) -> String {
        "scripted".to_string()
    }

    fn logits(&self, input: &InputTensor) -> Result<Vec<f32>, InferenceError> {
        self.inputs.borrow_mut().push(input.clone());
        Ok(self.scores.clone())
    }
}
