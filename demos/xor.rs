use mlp_engine::{ActivationType, Network, Sample, Trainer, TrainingParams};

fn main() -> mlp_engine::Result<()> {
    let network = Network::with_seed(&[2, 2, 1], &[ActivationType::Sigmoid, ActivationType::Sigmoid], 1)?;
    let mut trainer = Trainer::new(network);

    let samples = vec![
        Sample::new(vec![1.0, 0.0], vec![1.0]),
        Sample::new(vec![1.0, 1.0], vec![0.0]),
        Sample::new(vec![0.0, 1.0], vec![1.0]),
        Sample::new(vec![0.0, 0.0], vec![0.0]),
    ];

    let params = TrainingParams {
        learning_rate: 0.5,
        num_epochs: 5000,
        momentum: 0.9,
        seed: Some(7),
        ..Default::default()
    };

    let results = trainer.train(&samples, &params, |epoch, error| {
        if epoch % 1000 == 0 {
            println!("Epoch {epoch}: error = {error:.6}");
        }
    })?;
    println!("Final error after {} epochs: {:.6}", results.epochs_completed, results.final_error);

    let mut network = trainer.release_network().ok_or(mlp_engine::NetworkError::Unbound)?;
    for sample in &samples {
        let output = network.forward(&sample.inputs)?;
        println!("Input: {:?} -> Output: {:.4}", sample.inputs, output[0]);
    }
    Ok(())
}
