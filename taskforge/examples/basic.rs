/*
 * Copyright 2020 Nikhil Marathe <nsm.nikhil@gmail.com>
 * Copyright 2024 Task Graph Contributors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Minimal end-to-end usage: a three-task pipeline with bounded
//! concurrency and a verbose progress log.

use std::sync::Arc;

use taskforge::{fn_action, Artifact, Config, Sequence, TaskDescriptor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let fetch = fn_action(|_inputs| {
        Box::pin(async move { Ok(Arc::new(42i64) as Artifact) })
    });
    let double = fn_action(|inputs| {
        Box::pin(async move {
            let n = *inputs[0].downcast_ref::<i64>().unwrap();
            Ok(Arc::new(n * 2) as Artifact)
        })
    });
    let report_task = fn_action(|inputs| {
        Box::pin(async move {
            let n = *inputs[0].downcast_ref::<i64>().unwrap();
            Ok(Arc::new(format!("result = {n}")) as Artifact)
        })
    });

    let mut sequence = Sequence::new(Config {
        max_concurrency: 4,
        verbose: true,
    })
    .add_task(TaskDescriptor::new("fetch", fetch))
    .add_task(TaskDescriptor::new("double", double).parents(["fetch"]))
    .add_task(TaskDescriptor::new("report", report_task).parents(["double"]));

    let report = sequence.run().await?;
    println!(
        "succeeded={} failed={} skipped={}",
        report.succeeded, report.failed, report.skipped
    );
    if let Some(artifact) = sequence.artifact_of("report") {
        println!("{}", artifact.downcast_ref::<String>().unwrap());
    }
    Ok(())
}
