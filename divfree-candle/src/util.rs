//! Utilities.
use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
use divfree_core::DivfreeError;
use log::trace;
use ndarray::{Array1, ArrayD};
use rand::{distributions::Uniform, rngs::StdRng, Rng, SeedableRng};

/// Converts an array into a tensor of the same shape on `device`.
pub fn arrayd_to_tensor(a: &ArrayD<f32>, device: &Device) -> Result<Tensor> {
    let v = a.iter().copied().collect::<Vec<_>>();
    Ok(Tensor::from_vec(v, a.shape(), device)?)
}

/// Converts a tensor of rank 1 into an array.
pub fn tensor_to_array1(t: &Tensor) -> Result<Array1<f32>> {
    let v: Vec<f32> = t.to_device(&Device::Cpu)?.to_vec1()?;
    Ok(Array1::from(v))
}

/// Converts batches of states and next states into network inputs of shape
/// `(batch_size, state_dim)`.
///
/// Scalar states (batches of rank 1) become one feature column; states of higher rank are
/// flattened. Both batches must have the same rank.
pub fn state_tensors(
    state: &ArrayD<f32>,
    next_state: &ArrayD<f32>,
    device: &Device,
) -> Result<(Tensor, Tensor)> {
    if state.ndim() != next_state.ndim() {
        return Err(DivfreeError::AsymmetricStateRank {
            state_rank: state.ndim(),
            next_state_rank: next_state.ndim(),
        }
        .into());
    }
    let prep = |a: &ArrayD<f32>| -> Result<Tensor> {
        let t = arrayd_to_tensor(a, device)?;
        Ok(match t.rank() {
            1 => t.unsqueeze(1)?,
            2 => t,
            _ => t.flatten_from(1)?,
        })
    };

    Ok((prep(state)?, prep(next_state)?))
}

/// Returns the number of features of a flattened state with the given shape.
///
/// `shape` excludes the batch dimension; scalar states have one feature.
pub fn state_dim(shape: &[usize]) -> usize {
    shape.iter().product::<usize>().max(1)
}

/// Draws the parameters of the linear layers in `varmap` uniformly in
/// `[-1/sqrt(fan_in), 1/sqrt(fan_in)]`.
///
/// Rank-2 variables named `*weight` are weights of linear layers; `*bias` variables are
/// initialized with the fan-in of the matching weight. Other variables, such as the
/// parameters of layer normalization, are kept as they are.
pub fn init_linear_uniform(varmap: &VarMap, seed: u64) -> Result<()> {
    let data = varmap.data().lock().unwrap();
    let mut names = data.keys().cloned().collect::<Vec<_>>();
    names.sort();
    let mut rng = StdRng::seed_from_u64(seed);

    for name in names.iter() {
        let var = &data[name];
        let fan_in = if name.ends_with("weight") && var.rank() == 2 {
            Some(var.dims()[1])
        } else if let Some(prefix) = name.strip_suffix("bias") {
            data.get(&format!("{}weight", prefix))
                .filter(|w| w.rank() == 2)
                .map(|w| w.dims()[1])
        } else {
            None
        };

        if let Some(fan_in) = fan_in {
            trace!("Initialize {} with fan_in = {}", name, fan_in);
            let bound = 1.0 / (fan_in as f32).sqrt();
            let dist = Uniform::new_inclusive(-bound, bound);
            let v = (0..var.elem_count())
                .map(|_| rng.sample(&dist))
                .collect::<Vec<f32>>();
            var.set(&Tensor::from_vec(v, var.dims(), var.device())?)?;
        }
    }

    Ok(())
}

/// Copies the values of the variables in `src` into the variables of `dest` with the
/// same names, moving them to the device of the destination.
pub fn copy_vars(dest: &VarMap, src: &VarMap) -> Result<()> {
    let dest = dest.data().lock().unwrap();
    let src = src.data().lock().unwrap();

    for (name, v_dest) in dest.iter() {
        let v_src = src
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Variable {} not found in source", name))?;
        v_dest.set(&v_src.as_tensor().to_device(v_dest.device())?)?;
    }

    Ok(())
}
